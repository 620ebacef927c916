//! Message boundary between the configuration UI and the synthesis engine.
//!
//! The UI posts one [`ControlMessage`] per "apply" and expects one
//! [`ResultMessage`] back. Each message triggers exactly one orchestrator run.
//! Progress is also published on the [`EventBus`] so UI panels can react
//! without polling the result.
//!
//! Wire format (camelCase JSON). `messageId` is optional and echoed back in
//! the reply so the UI can pair requests with results:
//! ```json
//! { "messageId": "42", "firstElementType": "Tabs", "secondElementType": "Tab",
//!   "triggerBehaviorGroups": [{"propertyName": "State", "targetValue": "Active"}],
//!   "othersBehaviorGroups":  [{"propertyName": "State", "targetValue": "keep-initial"}],
//!   "exclusive": true }
//! ```

use anyhow::{Context, Result};
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::config::SynthConfig;
use crate::core::event_bus::EventBus;
use crate::entities::{BehaviorList, Semantics};
use crate::host::Host;
use crate::synth::{Orchestrator, RunReport, SynthesisRequest};

/// Inbound request from the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Names the interaction group; used as the namespace name
    #[serde(default)]
    pub first_element_type: String,
    /// Display name of the candidate instances
    pub second_element_type: String,
    #[serde(default)]
    pub trigger_behavior_groups: BehaviorList,
    #[serde(default)]
    pub others_behavior_groups: BehaviorList,
    #[serde(default)]
    pub exclusive: bool,
}

impl ControlMessage {
    pub fn to_request(&self, config: &SynthConfig) -> SynthesisRequest {
        let namespace = match self.first_element_type.trim() {
            "" => config.default_namespace.clone(),
            name => name.to_string(),
        };
        SynthesisRequest {
            candidate_name: self.second_element_type.clone(),
            namespace,
            trigger: self.trigger_behavior_groups.clone(),
            others: self.others_behavior_groups.clone(),
            semantics: Semantics::from_exclusive(self.exclusive),
        }
    }
}

/// Outbound reply to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMessage {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl ResultMessage {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            message_id: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            message_id: None,
        }
    }

    pub fn with_message_id(mut self, message_id: Option<String>) -> Self {
        self.message_id = message_id;
        self
    }
}

/// Published before a run starts.
#[derive(Debug, Clone)]
pub struct SynthesisStarted {
    pub candidate_name: String,
    pub namespace: String,
}

/// Published once per run with the reply and, on success, the report.
#[derive(Debug, Clone)]
pub struct SynthesisFinished {
    pub result: ResultMessage,
    pub report: Option<RunReport>,
}

/// Owns the host and handles control messages one at a time.
pub struct Plugin<H: Host> {
    host: H,
    config: SynthConfig,
    bus: EventBus,
}

impl<H: Host> Plugin<H> {
    pub fn new(host: H, config: SynthConfig) -> Self {
        Self {
            host,
            config,
            bus: EventBus::new(),
        }
    }

    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Run one full synthesis for `message`.
    pub fn handle(&mut self, message: &ControlMessage) -> ResultMessage {
        let request = message.to_request(&self.config);
        self.bus.emit(SynthesisStarted {
            candidate_name: request.candidate_name.clone(),
            namespace: request.namespace.clone(),
        });

        let outcome = Orchestrator::new(&mut self.host, &self.config).run(&request);
        let (result, report) = match outcome {
            Ok(report) => {
                info!(
                    "Applied interactions to {} {:?} instances",
                    report.candidates, request.candidate_name
                );
                (ResultMessage::ok(), Some(report))
            }
            Err(e) => {
                error!("Synthesis failed: {}", e);
                (ResultMessage::failed(e.to_string()), None)
            }
        };
        let result = result.with_message_id(message.message_id.clone());

        self.bus.emit(SynthesisFinished {
            result: result.clone(),
            report,
        });
        result
    }

    /// JSON in, JSON out. Malformed input is reported as a failed result,
    /// still carrying the `messageId` when one can be read.
    pub fn handle_json(&mut self, json: &str) -> Result<String> {
        let result = match serde_json::from_str::<ControlMessage>(json) {
            Ok(message) => self.handle(&message),
            Err(e) => {
                error!("Rejecting malformed control message: {}", e);
                ResultMessage::failed(format!("Invalid message: {}", e)).with_message_id(message_id_of(json))
            }
        };
        serde_json::to_string(&result).context("Failed to serialize result message")
    }
}

/// Best-effort `messageId` from a message that failed to decode.
fn message_id_of(json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(json).ok()?;
    match value.get("messageId")? {
        serde_json::Value::String(id) => Some(id.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::downcast_event;
    use crate::entities::{BehaviorGroup, CellValue, ComponentSchema, NodeId, PropValue, PropertySchemaEntry, Target};
    use crate::host::MemoryHost;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn host() -> MemoryHost {
        let mut host = MemoryHost::new();
        host.add_component(
            "tab",
            "Tab",
            None,
            ComponentSchema::new(vec![PropertySchemaEntry::boolean("Selected", true)]),
        );
        let row = host.add_frame(None, "row", "Tabs");
        for i in 0..2 {
            host.add_instance(
                Some(&row),
                &format!("tab{i}"),
                "Tab",
                "tab",
                &[("Selected", PropValue::Bool(i == 0))],
            );
        }
        host.select(&[&row]);
        host
    }

    fn config() -> SynthConfig {
        SynthConfig {
            settle_interval_ms: 0,
            ..Default::default()
        }
    }

    const MESSAGE: &str = r#"{
        "firstElementType": "Tabs",
        "secondElementType": "Tab",
        "triggerBehaviorGroups": [{"propertyName": "Selected", "targetValue": true}],
        "othersBehaviorGroups": [{"propertyName": "Selected", "targetValue": "keep-initial"}],
        "exclusive": true
    }"#;

    #[test]
    fn test_message_decoding() {
        let msg: ControlMessage = serde_json::from_str(MESSAGE).unwrap();
        assert_eq!(msg.second_element_type, "Tab");
        assert_eq!(msg.others_behavior_groups.target("Selected"), Some(&Target::KeepInitial));

        let req = msg.to_request(&config());
        assert_eq!(req.namespace, "Tabs");
        assert!(req.semantics.is_exclusive());

        let anonymous = ControlMessage {
            first_element_type: " ".into(),
            ..msg
        };
        assert_eq!(anonymous.to_request(&config()).namespace, "State Machine Variables");
    }

    #[test]
    fn test_handle_json_success() {
        let mut plugin = Plugin::new(host(), config());
        let reply = plugin.handle_json(MESSAGE).unwrap();
        assert_eq!(reply, r#"{"success":true}"#);

        let host = plugin.host_mut();
        host.fire(&NodeId::from("tab1")).unwrap();
        assert_eq!(host.effective_value(&NodeId::from("tab1"), "Selected"), Some(CellValue::Bool(true)));
        // tab0 kept its initial true, so it falls back to false
        assert_eq!(host.effective_value(&NodeId::from("tab0"), "Selected"), Some(CellValue::Bool(false)));
    }

    #[test]
    fn test_message_id_is_echoed() {
        let mut plugin = Plugin::new(host(), config());
        let message = MESSAGE.replacen('{', r#"{"messageId": "req-7","#, 1);
        let reply: ResultMessage = serde_json::from_str(&plugin.handle_json(&message).unwrap()).unwrap();
        assert!(reply.success);
        assert_eq!(reply.message_id.as_deref(), Some("req-7"));

        let reply = plugin.handle_json(r#"{"messageId": 8, "exclusive": "yes"}"#).unwrap();
        assert!(reply.contains(r#""messageId":"8""#));
        assert!(reply.contains(r#""success":false"#));
    }

    #[test]
    fn test_failure_reply_and_events() {
        let bus = EventBus::new();
        let seen = Arc::new(AtomicBool::new(false));
        let s = Arc::clone(&seen);
        bus.subscribe::<SynthesisFinished, _>(move |e| {
            s.store(!e.result.success && e.report.is_none(), Ordering::SeqCst);
        });

        let mut plugin = Plugin::new(host(), config()).with_bus(bus.clone());
        let reply = plugin.handle(&ControlMessage {
            message_id: None,
            first_element_type: "Tabs".into(),
            second_element_type: "Chip".into(),
            trigger_behavior_groups: BehaviorList::new(vec![BehaviorGroup::set("Selected", "true")]),
            others_behavior_groups: BehaviorList::default(),
            exclusive: false,
        });

        assert_eq!(
            reply,
            ResultMessage::failed("No valid instances found with name: Chip in the current selection context")
        );
        assert!(seen.load(Ordering::SeqCst));
        let events = bus.poll();
        assert_eq!(events.len(), 2);
        assert!(downcast_event::<SynthesisStarted>(&events[0]).is_some());
    }

    #[test]
    fn test_malformed_json_is_a_failed_result() {
        let mut plugin = Plugin::new(host(), config());
        let reply: ResultMessage = serde_json::from_str(&plugin.handle_json("{not json").unwrap()).unwrap();
        assert!(!reply.success);
        assert!(reply.error.unwrap().starts_with("Invalid message"));
    }
}
