use std::pin::Pin;

use crate::handler::IntoOutcome;
use crate::{Context, Handler};
use anyhow::Error;

pub(crate) struct SyncHandler<F>(pub(crate) F);

#[async_trait]
impl<F, Res> Handler for SyncHandler<F>
where
    F: Fn(&mut Context) -> Res + Send + Sync + 'static,
    Res: IntoOutcome + Send + 'static,
{
    async fn apply(self: Pin<&Self>, context: &mut Context) -> Result<(), Error> {
        let f = &self.0;
        f(context).into_outcome()
    }
}
