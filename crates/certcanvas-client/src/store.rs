//! `DesignStore` over the certificate endpoints.

use crate::client::ApiClient;
use certcanvas_core::storage::{
    BoxFuture, Design, DesignDraft, DesignStore, SaveMode, StoreResult,
};

impl DesignStore for ApiClient {
    fn fetch(&self, id: &str) -> BoxFuture<'_, StoreResult<Design>> {
        let id = id.to_string();
        Box::pin(async move {
            self.certificate(&id)
                .await
                .map_err(|e| e.into_store_error(&id))
        })
    }

    fn create(&self, draft: &DesignDraft) -> BoxFuture<'_, StoreResult<Design>> {
        let draft = draft.clone();
        Box::pin(async move {
            self.create_certificate(&draft)
                .await
                .map_err(|e| e.into_store_error("new design"))
        })
    }

    fn update(
        &self,
        id: &str,
        draft: &DesignDraft,
        mode: SaveMode,
    ) -> BoxFuture<'_, StoreResult<Design>> {
        let id = id.to_string();
        let draft = draft.clone();
        Box::pin(async move {
            self.update_certificate(&id, &draft, mode)
                .await
                .map_err(|e| e.into_store_error(&id))
        })
    }

    fn anchors(&self, id: &str) -> BoxFuture<'_, StoreResult<Vec<String>>> {
        let id = id.to_string();
        Box::pin(async move { self.anchors(&id).await.map_err(|e| e.into_store_error(&id)) })
    }
}
