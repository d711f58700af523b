//! IO atoms: `http.fetch`.

use super::{capability_error, opt_resolved, resolved, resolved_string, type_error};
use crate::atom::{Atom, AtomSpec};
use crate::config::VmConfig;
use crate::context::RuntimeContext;
use crate::registry::AtomRegistry;
use async_trait::async_trait;
use reagent_backends::FetchInit;
use reagent_core::{Step, Value, VmResult};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

pub fn install(registry: &AtomRegistry, config: &VmConfig) -> VmResult<()> {
    registry.register(Arc::new(HttpFetchAtom::new(config)?));
    Ok(())
}

/// Perform an HTTP request through the host's fetch capability.
pub struct HttpFetchAtom {
    spec: AtomSpec,
}

impl HttpFetchAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new("http.fetch", "Fetch a URL through the host's HTTP capability.")
                .with_timeout_ms(config.io_timeout_ms)
                .with_input_schema(json!({
                    "type": "object",
                    "properties": {
                        "url": {},
                        "method": {},
                        "headers": {},
                        "body": {}
                    },
                    "required": ["url"]
                }))?,
        })
    }
}

#[async_trait]
impl Atom for HttpFetchAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let http = ctx.capabilities.require_http()?;

        let url = resolved_string(step, "url", ctx)?;
        let mut init = FetchInit::default();
        if let Some(method) = opt_resolved(step, "method", ctx) {
            match method {
                Value::String(m) => init.method = m.to_uppercase(),
                other => return Err(type_error(step, "method", "a string", &other)),
            }
        }
        if let Some(headers) = opt_resolved(step, "headers", ctx) {
            match headers {
                Value::Object(map) => {
                    let mut flat = HashMap::with_capacity(map.len());
                    for (name, value) in map {
                        flat.insert(name, value.display_string());
                    }
                    init.headers = flat;
                }
                other => return Err(type_error(step, "headers", "an object", &other)),
            }
        }
        if step.field("body").is_some() {
            init.body = Some(resolved(step, "body", ctx)?);
        }

        let response = http
            .fetch(&url, init)
            .await
            .map_err(|e| capability_error("fetch", e))?;
        Ok(Some(response))
    }
}
