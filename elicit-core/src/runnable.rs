use async_trait::async_trait;

use crate::ElicitError;

#[async_trait]
pub trait Runnable<Input: Send + 'static, Output: Send + 'static> {
    async fn invoke(&self, input: Input) -> Result<Output, ElicitError>;
}
