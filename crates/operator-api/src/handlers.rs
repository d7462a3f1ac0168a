//! Trigger handlers
//!
//! Thin HTTP surface over the trigger store. Writes are write-through:
//! a 200 response means the definition reached the remote store, not
//! that the in-memory mirror already reflects it; that happens once the
//! watch delivers the corresponding notification.

use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use trigger_engine::TriggerStore;

use crate::models::{
    ErrorResponse, ListTriggersResponse, RemoveTriggerResponse, SaveTriggerRequest,
    SuccessResponse,
};

/// Shared handle to the trigger store injected into every handler
pub type StoreHandle = Arc<dyn TriggerStore>;

/// Liveness probe
///
/// GET /api/v1/health
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// List triggers in a namespace
///
/// GET /api/v1/namespaces/{namespace}/triggers
///
/// An unknown namespace yields an empty list, not an error.
pub async fn list_triggers(
    store: web::Data<StoreHandle>,
    path: web::Path<String>,
) -> impl Responder {
    let namespace = path.into_inner();
    let triggers = store.get_triggers(&namespace);
    HttpResponse::Ok().json(ListTriggersResponse { triggers })
}

/// Add a trigger
///
/// POST /api/v1/triggers
pub async fn add_trigger(
    store: web::Data<StoreHandle>,
    req: web::Json<SaveTriggerRequest>,
) -> impl Responder {
    save_trigger(store.get_ref(), req.into_inner()).await
}

/// Update a trigger. Same semantics as add: both are an upsert keyed by
/// (namespace, id).
///
/// PUT /api/v1/triggers
pub async fn update_trigger(
    store: web::Data<StoreHandle>,
    req: web::Json<SaveTriggerRequest>,
) -> impl Responder {
    save_trigger(store.get_ref(), req.into_inner()).await
}

async fn save_trigger(store: &StoreHandle, req: SaveTriggerRequest) -> HttpResponse {
    let Some(mut trigger) = req.trigger else {
        return HttpResponse::BadRequest()
            .json(ErrorResponse::new("validation_error", "trigger is required"));
    };

    // Assign an id for operators that omit one
    if trigger.id.is_empty() {
        trigger.id = uuid::Uuid::new_v4().to_string();
    }

    if let Err(e) = trigger.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "validation_error",
            format!("Validation failed: {}", e),
        ));
    }

    match store
        .save_trigger(&trigger.namespace, &trigger.id, &trigger)
        .await
    {
        Ok(()) => HttpResponse::Ok().json(SuccessResponse::new(trigger)),
        Err(e) => {
            tracing::error!("Failed to save trigger: {:#}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new(
                "internal_error",
                "Failed to save trigger",
            ))
        }
    }
}

/// Remove a trigger by namespace and id
///
/// DELETE /api/v1/namespaces/{namespace}/triggers/{id}
pub async fn remove_trigger(
    store: web::Data<StoreHandle>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (namespace, id) = path.into_inner();

    match store.delete_trigger(&namespace, &id).await {
        Ok(()) => HttpResponse::Ok().json(RemoveTriggerResponse { success: true }),
        Err(e) => {
            tracing::error!("Failed to delete trigger: {:#}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new(
                "internal_error",
                "Failed to delete trigger",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;
    use shared::Trigger;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::routes;

    /// Mock trigger store for handler tests
    #[derive(Default)]
    struct MockTriggerStore {
        triggers: Mutex<HashMap<String, Vec<Trigger>>>,
        saved: Mutex<Vec<(String, String, Trigger)>>,
        deleted: Mutex<Vec<(String, String)>>,
        fail_writes: bool,
    }

    impl MockTriggerStore {
        fn with_triggers(namespace: &str, triggers: Vec<Trigger>) -> Self {
            let store = Self::default();
            store
                .triggers
                .lock()
                .unwrap()
                .insert(namespace.to_string(), triggers);
            store
        }

        fn failing() -> Self {
            Self {
                fail_writes: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl TriggerStore for MockTriggerStore {
        async fn load_all(&self) -> Result<()> {
            Ok(())
        }

        async fn watch(&self) -> Result<()> {
            Ok(())
        }

        fn get_triggers(&self, namespace: &str) -> Vec<Trigger> {
            self.triggers
                .lock()
                .unwrap()
                .get(namespace)
                .cloned()
                .unwrap_or_default()
        }

        fn get_all_triggers(&self) -> Vec<Trigger> {
            self.triggers
                .lock()
                .unwrap()
                .values()
                .flatten()
                .cloned()
                .collect()
        }

        async fn save_trigger(
            &self,
            namespace: &str,
            name: &str,
            trigger: &Trigger,
        ) -> Result<()> {
            if self.fail_writes {
                anyhow::bail!("store unreachable");
            }
            self.saved.lock().unwrap().push((
                namespace.to_string(),
                name.to_string(),
                trigger.clone(),
            ));
            Ok(())
        }

        async fn delete_trigger(&self, namespace: &str, name: &str) -> Result<()> {
            if self.fail_writes {
                anyhow::bail!("store unreachable");
            }
            self.deleted
                .lock()
                .unwrap()
                .push((namespace.to_string(), name.to_string()));
            Ok(())
        }

        fn close(&self) {}
    }

    macro_rules! service {
        ($store:expr) => {{
            let store: StoreHandle = $store;
            test::init_service(
                App::new()
                    .app_data(web::Data::new(store))
                    .configure(routes::configure),
            )
            .await
        }};
    }

    fn sample_trigger() -> Trigger {
        Trigger {
            id: "t1".to_string(),
            name: "Sample".to_string(),
            namespace: "core".to_string(),
            event_type: "user.created".to_string(),
            enabled: true,
            ..Trigger::default()
        }
    }

    #[actix_web::test]
    async fn test_list_triggers_returns_namespace_snapshot() {
        let mock = Arc::new(MockTriggerStore::with_triggers(
            "core",
            vec![sample_trigger()],
        ));
        let app = service!(mock.clone());

        let req = test::TestRequest::get()
            .uri("/api/v1/namespaces/core/triggers")
            .to_request();
        let body: ListTriggersResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.triggers.len(), 1);
        assert_eq!(body.triggers[0].id, "t1");

        let req = test::TestRequest::get()
            .uri("/api/v1/namespaces/unknown/triggers")
            .to_request();
        let body: ListTriggersResponse = test::call_and_read_body_json(&app, req).await;
        assert!(body.triggers.is_empty());
    }

    #[actix_web::test]
    async fn test_add_trigger_writes_through() {
        let mock = Arc::new(MockTriggerStore::default());
        let app = service!(mock.clone());

        let req = test::TestRequest::post()
            .uri("/api/v1/triggers")
            .set_json(json!({ "trigger": sample_trigger() }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let saved = mock.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        let (namespace, name, trigger) = &saved[0];
        assert_eq!(namespace, "core");
        assert_eq!(name, "t1");
        assert_eq!(trigger.event_type, "user.created");
    }

    #[actix_web::test]
    async fn test_add_trigger_without_payload_is_rejected() {
        let mock = Arc::new(MockTriggerStore::default());
        let app = service!(mock.clone());

        let req = test::TestRequest::post()
            .uri("/api/v1/triggers")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(mock.saved.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_add_trigger_without_namespace_is_rejected() {
        let mock = Arc::new(MockTriggerStore::default());
        let app = service!(mock.clone());

        let mut trigger = sample_trigger();
        trigger.namespace = String::new();
        let req = test::TestRequest::post()
            .uri("/api/v1/triggers")
            .set_json(json!({ "trigger": trigger }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_add_trigger_assigns_id_when_blank() {
        let mock = Arc::new(MockTriggerStore::default());
        let app = service!(mock.clone());

        let mut trigger = sample_trigger();
        trigger.id = String::new();
        let req = test::TestRequest::post()
            .uri("/api/v1/triggers")
            .set_json(json!({ "trigger": trigger }))
            .to_request();
        let body: SuccessResponse<Trigger> = test::call_and_read_body_json(&app, req).await;
        assert!(!body.data.id.is_empty());

        let saved = mock.saved.lock().unwrap();
        assert_eq!(saved[0].1, body.data.id);
    }

    #[actix_web::test]
    async fn test_update_trigger_is_an_upsert() {
        let mock = Arc::new(MockTriggerStore::default());
        let app = service!(mock.clone());

        let req = test::TestRequest::put()
            .uri("/api/v1/triggers")
            .set_json(json!({ "trigger": sample_trigger() }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(mock.saved.lock().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_remove_trigger_reports_success() {
        let mock = Arc::new(MockTriggerStore::default());
        let app = service!(mock.clone());

        let req = test::TestRequest::delete()
            .uri("/api/v1/namespaces/core/triggers/t1")
            .to_request();
        let body: RemoveTriggerResponse = test::call_and_read_body_json(&app, req).await;
        assert!(body.success);
        assert_eq!(
            mock.deleted.lock().unwrap().as_slice(),
            &[("core".to_string(), "t1".to_string())]
        );
    }

    #[actix_web::test]
    async fn test_store_failure_surfaces_as_internal_error() {
        let mock = Arc::new(MockTriggerStore::failing());
        let app = service!(mock.clone());

        let req = test::TestRequest::post()
            .uri("/api/v1/triggers")
            .set_json(json!({ "trigger": sample_trigger() }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let req = test::TestRequest::delete()
            .uri("/api/v1/namespaces/core/triggers/t1")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
