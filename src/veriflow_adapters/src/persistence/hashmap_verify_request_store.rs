use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use veriflow_core::{
    Email, MessageRef, StatusUpdate, VerifyRequest, VerifyRequestId, VerifyRequestStore,
    VerifyRequestStoreError, VerifyStatus,
};

#[derive(Default)]
struct Requests {
    by_id: HashMap<VerifyRequestId, VerifyRequest>,
    // requestor e-mail -> request ids, in insertion order
    by_requestor: HashMap<Email, Vec<VerifyRequestId>>,
}

#[derive(Default, Clone)]
pub struct HashMapVerifyRequestStore {
    requests: Arc<RwLock<Requests>>,
}

impl HashMapVerifyRequestStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut requests: Vec<VerifyRequest>) -> Vec<VerifyRequest> {
    requests.sort_by_key(|r| std::cmp::Reverse(r.start()));
    requests
}

#[async_trait::async_trait]
impl VerifyRequestStore for HashMapVerifyRequestStore {
    async fn insert_request(&self, request: VerifyRequest) -> Result<(), VerifyRequestStoreError> {
        let mut requests = self.requests.write().await;
        if requests.by_id.contains_key(request.id()) {
            return Err(VerifyRequestStoreError::RequestAlreadyExists);
        }
        requests
            .by_requestor
            .entry(request.requestor().email.clone())
            .or_default()
            .push(*request.id());
        requests.by_id.insert(*request.id(), request);
        Ok(())
    }

    async fn get_request(
        &self,
        id: &VerifyRequestId,
    ) -> Result<VerifyRequest, VerifyRequestStoreError> {
        let requests = self.requests.read().await;
        requests
            .by_id
            .get(id)
            .cloned()
            .ok_or(VerifyRequestStoreError::RequestNotFound)
    }

    async fn list_by_requestor(
        &self,
        email: &Email,
    ) -> Result<Vec<VerifyRequest>, VerifyRequestStoreError> {
        let requests = self.requests.read().await;
        let found = requests
            .by_requestor
            .get(email)
            .into_iter()
            .flatten()
            .filter_map(|id| requests.by_id.get(id).cloned())
            .collect();
        Ok(newest_first(found))
    }

    async fn list_by_recipient(
        &self,
        email: &Email,
    ) -> Result<Vec<VerifyRequest>, VerifyRequestStoreError> {
        let requests = self.requests.read().await;
        let found = requests
            .by_id
            .values()
            .filter(|r| &r.recipient().email == email)
            .cloned()
            .collect();
        Ok(newest_first(found))
    }

    async fn update_if_status(
        &self,
        expected: VerifyStatus,
        request: &VerifyRequest,
    ) -> Result<StatusUpdate, VerifyRequestStoreError> {
        let mut requests = self.requests.write().await;
        let stored = requests
            .by_id
            .get_mut(request.id())
            .ok_or(VerifyRequestStoreError::RequestNotFound)?;

        if stored.status() != expected {
            return Ok(StatusUpdate::Rejected(Box::new(stored.clone())));
        }

        let mut next = request.clone();
        next.keep_delivery_records(stored);
        *stored = next;
        Ok(StatusUpdate::Applied)
    }

    async fn attach_artifacts(
        &self,
        id: &VerifyRequestId,
        artifacts: Vec<MessageRef>,
    ) -> Result<(), VerifyRequestStoreError> {
        let mut requests = self.requests.write().await;
        requests
            .by_id
            .get_mut(id)
            .ok_or(VerifyRequestStoreError::RequestNotFound)?
            .attach_artifacts(artifacts);
        Ok(())
    }

    async fn set_permalink(
        &self,
        id: &VerifyRequestId,
        permalink: String,
    ) -> Result<(), VerifyRequestStoreError> {
        let mut requests = self.requests.write().await;
        requests
            .by_id
            .get_mut(id)
            .ok_or(VerifyRequestStoreError::RequestNotFound)?
            .set_permalink(permalink);
        Ok(())
    }
}
