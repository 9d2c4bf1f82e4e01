use std::pin::Pin;

use crate::{Context, Handler};
use anyhow::Error;
use futures::future::BoxFuture;

pub(crate) struct FutureHandler<F>(pub(crate) F);

#[async_trait]
impl<F> Handler for FutureHandler<F>
where
    F: for<'c> Fn(&'c mut Context) -> BoxFuture<'c, Result<(), Error>> + Send + Sync + 'static,
{
    async fn apply(self: Pin<&Self>, context: &mut Context) -> Result<(), Error> {
        let f = &self.0;
        f(context).await
    }
}
