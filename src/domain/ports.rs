use crate::domain::model::{Page, PlaceMatch};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 單一頁面的修補動作。回傳 None 表示頁面不需要變更，
/// 對同一頁面重複執行必須不再產生變更。
pub trait Patch: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, page: &Page) -> Result<Option<String>>;
}

/// 以文字查詢地點
#[async_trait]
pub trait Geocoder: Send + Sync {
    fn source(&self) -> &'static str;
    async fn lookup(&self, query: &str) -> Result<Option<PlaceMatch>>;
}
