//! Per-process gateway context

use std::sync::Arc;

use crate::access::AllowList;
use crate::config::Settings;
use crate::geometry::{GeoJsonPassthrough, GeometryConverter};
use crate::store::Store;

/// Everything a tool call needs, built once at startup and shared read-only
#[derive(Clone)]
pub struct Gateway {
    pub settings: Arc<Settings>,
    pub allow_list: Arc<AllowList>,
    pub store: Arc<dyn Store>,
    pub converter: Arc<dyn GeometryConverter>,
}

impl Gateway {
    pub fn new(settings: Settings, store: Arc<dyn Store>) -> Self {
        Self::with_converter(settings, store, Arc::new(GeoJsonPassthrough))
    }

    pub fn with_converter(
        settings: Settings,
        store: Arc<dyn Store>,
        converter: Arc<dyn GeometryConverter>,
    ) -> Self {
        let allow_list = settings.allow_list();
        Self {
            settings: Arc::new(settings),
            allow_list: Arc::new(allow_list),
            store,
            converter,
        }
    }

    pub fn schema(&self) -> &str {
        &self.settings.schema
    }
}
