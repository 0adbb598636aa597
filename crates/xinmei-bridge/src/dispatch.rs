// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Method-call dispatch for the sms and device channels.
//
// The shell sends `{ method, arguments }` on a named channel. Known methods
// on their own channel run against the accessors and always succeed with a
// value; everything else is answered with `notImplemented`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use xinmei_core::error::{BridgeError, Result};
use xinmei_core::{BridgeConfig, MessageId, SubscriptionInfo};

use crate::messages::MessageStoreAccessor;
use crate::subscriptions::SubscriptionRegistryAccessor;
use crate::traits::PlatformBridge;

/// Argument key carrying the message id for `deleteSms`.
pub const ARG_ID: &str = "id";
/// Argument key carrying the message id for `getSmsSubscriptionId`.
pub const ARG_MESSAGE_ID: &str = "messageId";

/// The two method channels the shell registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Sms,
    Device,
}

/// Every method the bridge serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    DeleteMessage,
    GetSubscriptionForMessage,
    ListSimSubscriptions,
    GetDeviceIdentifier,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Self::DeleteMessage,
        Self::GetSubscriptionForMessage,
        Self::ListSimSubscriptions,
        Self::GetDeviceIdentifier,
    ];

    /// Method name used on the wire.
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::DeleteMessage => "deleteSms",
            Self::GetSubscriptionForMessage => "getSmsSubscriptionId",
            Self::ListSimSubscriptions => "getSimInfo",
            Self::GetDeviceIdentifier => "getDeviceId",
        }
    }

    pub fn from_method_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.method_name() == name)
    }

    /// Channel this method is registered on.
    pub fn channel(&self) -> Channel {
        match self {
            Self::DeleteMessage | Self::GetSubscriptionForMessage => Channel::Sms,
            Self::ListSimSubscriptions | Self::GetDeviceIdentifier => Channel::Device,
        }
    }
}

/// A single method invocation from the shell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: Map::new(),
        }
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Message id under `key`. Strings are taken as-is and integers are
    /// converted; anything else counts as missing.
    pub fn message_id(&self, key: &str) -> Option<MessageId> {
        match self.arguments.get(key)? {
            Value::String(s) => Some(MessageId::new(s.as_str())),
            Value::Number(n) => n.as_i64().map(MessageId::from),
            _ => None,
        }
    }
}

/// A method call addressed to a channel, as read by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub channel: String,
    #[serde(flatten)]
    pub call: MethodCall,
}

/// Typed success value of a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    /// `deleteSms`: whether anything was removed.
    Deleted(bool),
    /// `getSmsSubscriptionId`: the `sub_id`, or `-1` if unknown.
    SubscriptionId(i32),
    /// `getSimInfo`
    Subscriptions(Vec<SubscriptionInfo>),
    /// `getDeviceId`: `null` when the setting is unset.
    DeviceId(Option<String>),
}

/// Reply sent back on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "camelCase")]
pub enum MethodResult {
    Success(Outcome),
    NotImplemented,
}

/// Routes method calls to the accessors over one platform bridge.
pub struct Dispatcher {
    bridge: Box<dyn PlatformBridge>,
    config: BridgeConfig,
}

impl Dispatcher {
    pub fn new(bridge: Box<dyn PlatformBridge>, config: BridgeConfig) -> Self {
        tracing::info!(platform = bridge.platform_name(), "dispatcher ready");
        Self { bridge, config }
    }

    /// Map a channel name from the config to its [`Channel`].
    pub fn channel(&self, name: &str) -> Option<Channel> {
        if name == self.config.sms_channel {
            Some(Channel::Sms)
        } else if name == self.config.device_channel {
            Some(Channel::Device)
        } else {
            None
        }
    }

    /// Run `call` on the named channel. Methods registered on the other
    /// channel, and unknown channels, are not implemented.
    pub fn call(&self, channel: &str, call: &MethodCall) -> Result<Outcome> {
        tracing::info!(
            channel,
            method = %call.method,
            arguments = ?call.arguments,
            "received method call"
        );
        let op = Operation::from_method_name(&call.method)
            .filter(|op| self.channel(channel) == Some(op.channel()));
        match op {
            Some(op) => Ok(self.run(op, call)),
            None => {
                let err = BridgeError::NotImplemented {
                    channel: channel.to_owned(),
                    method: call.method.clone(),
                };
                tracing::warn!(%err, "method not implemented");
                Err(err)
            }
        }
    }

    /// [`Self::call`], folded into a channel reply.
    pub fn dispatch_on(&self, channel: &str, call: &MethodCall) -> MethodResult {
        match self.call(channel, call) {
            Ok(outcome) => MethodResult::Success(outcome),
            Err(_) => MethodResult::NotImplemented,
        }
    }

    /// Run `call` whichever channel it arrived on.
    pub fn dispatch(&self, call: &MethodCall) -> MethodResult {
        tracing::info!(method = %call.method, arguments = ?call.arguments, "received method call");
        match Operation::from_method_name(&call.method) {
            Some(op) => MethodResult::Success(self.run(op, call)),
            None => {
                tracing::warn!(method = %call.method, "method not implemented");
                MethodResult::NotImplemented
            }
        }
    }

    pub fn handle_envelope(&self, envelope: &Envelope) -> MethodResult {
        self.dispatch_on(&envelope.channel, &envelope.call)
    }

    fn run(&self, op: Operation, call: &MethodCall) -> Outcome {
        let bridge = self.bridge.as_ref();
        match op {
            Operation::DeleteMessage => {
                let id = call.message_id(ARG_ID);
                tracing::debug!(id = ?id, "deleting SMS");
                Outcome::Deleted(MessageStoreAccessor::new(bridge).delete_message(id.as_ref()))
            }
            Operation::GetSubscriptionForMessage => {
                let id = call.message_id(ARG_MESSAGE_ID);
                tracing::debug!(id = ?id, "getting subscription id for message");
                Outcome::SubscriptionId(
                    MessageStoreAccessor::new(bridge).subscription_for_message(id.as_ref()),
                )
            }
            Operation::ListSimSubscriptions => {
                Outcome::Subscriptions(self.registry().list_sim_subscriptions())
            }
            Operation::GetDeviceIdentifier => {
                Outcome::DeviceId(self.registry().device_identifier())
            }
        }
    }

    fn registry(&self) -> SubscriptionRegistryAccessor<'_, dyn PlatformBridge> {
        SubscriptionRegistryAccessor::new(
            self.bridge.as_ref(),
            &self.config.unknown_number_placeholder,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryBridge, StoredMessage};
    use crate::traits::{ANDROID_ID, DeviceSettings, MessageStore, SubscriptionRegistry};
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use xinmei_core::{AccessFault, Collection, Row, Selection, SubscriptionRecord};

    const SMS: &str = "com.nmg.xinmeisms/sms";
    const DEVICE: &str = "com.nmg.xinmeisms/device";

    /// Lets a test keep a handle on the fake after handing it to the dispatcher.
    struct Shared(Arc<MemoryBridge>);

    impl MessageStore for Shared {
        fn delete(&self, c: Collection, s: &Selection) -> std::result::Result<u64, AccessFault> {
            self.0.delete(c, s)
        }

        fn query_first(
            &self,
            c: Collection,
            p: &[&str],
            s: &Selection,
        ) -> std::result::Result<Option<Row>, AccessFault> {
            self.0.query_first(c, p, s)
        }
    }

    impl SubscriptionRegistry for Shared {
        fn active_subscriptions(
            &self,
        ) -> std::result::Result<Option<Vec<SubscriptionRecord>>, AccessFault> {
            self.0.active_subscriptions()
        }
    }

    impl DeviceSettings for Shared {
        fn secure_string(&self, key: &str) -> std::result::Result<Option<String>, AccessFault> {
            self.0.secure_string(key)
        }
    }

    impl PlatformBridge for Shared {
        fn platform_name(&self) -> &str {
            self.0.platform_name()
        }
    }

    fn setup() -> (Arc<MemoryBridge>, Dispatcher) {
        let bridge = Arc::new(MemoryBridge::new());
        let dispatcher = Dispatcher::new(Box::new(Shared(bridge.clone())), BridgeConfig::default());
        (bridge, dispatcher)
    }

    #[test]
    fn delete_sms_over_channel() {
        let (bridge, dispatcher) = setup();
        bridge.insert_message(12, StoredMessage::inbox(Some(1)));

        let call = MethodCall::new("deleteSms").with_argument(ARG_ID, "12");
        assert_eq!(
            dispatcher.dispatch_on(SMS, &call),
            MethodResult::Success(Outcome::Deleted(true))
        );
        assert_eq!(
            dispatcher.dispatch_on(SMS, &call),
            MethodResult::Success(Outcome::Deleted(false))
        );
        assert_eq!(bridge.message_count(), 0);
    }

    #[test]
    fn integer_message_id_is_accepted() {
        let (bridge, dispatcher) = setup();
        bridge.insert_message(8, StoredMessage::inbox(Some(2)));

        let call = MethodCall::new("getSmsSubscriptionId").with_argument(ARG_MESSAGE_ID, 8);
        assert_eq!(
            dispatcher.dispatch_on(SMS, &call),
            MethodResult::Success(Outcome::SubscriptionId(2))
        );
    }

    #[test]
    fn malformed_arguments_are_benign() {
        let (bridge, dispatcher) = setup();
        bridge.insert_message(1, StoredMessage::inbox(Some(1)));

        let wrong_key = MethodCall::new("deleteSms").with_argument(ARG_MESSAGE_ID, "1");
        let wrong_type =
            MethodCall::new("getSmsSubscriptionId").with_argument(ARG_MESSAGE_ID, true);
        assert_eq!(
            dispatcher.dispatch_on(SMS, &wrong_key),
            MethodResult::Success(Outcome::Deleted(false))
        );
        assert_eq!(
            dispatcher.dispatch_on(SMS, &wrong_type),
            MethodResult::Success(Outcome::SubscriptionId(-1))
        );
        assert!(bridge.contains_message(1));
    }

    #[test]
    fn unknown_method_is_not_implemented_and_touches_nothing() {
        let (bridge, dispatcher) = setup();
        bridge.insert_message(1, StoredMessage::inbox(Some(1)));

        let call = MethodCall::new("deleteAllSms").with_argument(ARG_ID, "1");
        assert_eq!(dispatcher.dispatch(&call), MethodResult::NotImplemented);
        assert_eq!(dispatcher.dispatch_on(SMS, &call), MethodResult::NotImplemented);
        assert!(matches!(
            dispatcher.call(SMS, &call),
            Err(BridgeError::NotImplemented { .. })
        ));
        assert_eq!(bridge.message_count(), 1);
    }

    #[test]
    fn methods_are_bound_to_their_channel() {
        let (bridge, dispatcher) = setup();
        bridge.insert_message(1, StoredMessage::inbox(Some(1)));

        let delete = MethodCall::new("deleteSms").with_argument(ARG_ID, "1");
        assert_eq!(dispatcher.dispatch_on(DEVICE, &delete), MethodResult::NotImplemented);
        assert_eq!(
            dispatcher.dispatch_on("com.example/other", &MethodCall::new("getDeviceId")),
            MethodResult::NotImplemented
        );
        assert!(bridge.contains_message(1));

        assert_eq!(
            dispatcher.dispatch(&delete),
            MethodResult::Success(Outcome::Deleted(true))
        );
    }

    #[test]
    fn device_channel_methods() {
        let (bridge, dispatcher) = setup();
        bridge.set_setting(ANDROID_ID, "9774d56d682e549c");
        bridge.set_subscriptions(Some(vec![SubscriptionRecord {
            slot_index: 0,
            subscription_id: 3,
            number: None,
            display_name: None,
        }]));

        assert_eq!(
            dispatcher.dispatch_on(DEVICE, &MethodCall::new("getDeviceId")),
            MethodResult::Success(Outcome::DeviceId(Some("9774d56d682e549c".into())))
        );
        let MethodResult::Success(Outcome::Subscriptions(sims)) =
            dispatcher.dispatch_on(DEVICE, &MethodCall::new("getSimInfo"))
        else {
            panic!("expected subscriptions");
        };
        assert_eq!(sims[0].display_name, "SIM1");
        assert_eq!(sims[0].number, "未知");
    }

    #[test]
    fn configured_placeholder_reaches_sim_info_reply() {
        let bridge = MemoryBridge::new();
        bridge.set_subscriptions(Some(vec![SubscriptionRecord {
            slot_index: 1,
            subscription_id: 4,
            number: None,
            display_name: Some("Work".into()),
        }]));
        let config = BridgeConfig {
            unknown_number_placeholder: "unknown".into(),
            ..BridgeConfig::default()
        };
        let dispatcher = Dispatcher::new(Box::new(bridge), config);

        let reply = dispatcher.dispatch_on(DEVICE, &MethodCall::new("getSimInfo"));
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"status": "success", "value": [
                {"slotIndex": 1, "subscriptionId": 4, "number": "unknown", "displayName": "Work"}
            ]})
        );
    }

    /// Collects the formatted fields of every event.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<String>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Captured {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            struct Fields(String);

            impl tracing::field::Visit for Fields {
                fn record_debug(
                    &mut self,
                    field: &tracing::field::Field,
                    value: &dyn std::fmt::Debug,
                ) {
                    self.0.push_str(&format!("{}={:?} ", field.name(), value));
                }
            }

            let mut fields = Fields(String::new());
            event.record(&mut fields);
            self.0.lock().unwrap().push(fields.0);
        }
    }

    #[test]
    fn received_calls_are_logged_with_arguments() {
        use tracing_subscriber::layer::SubscriberExt;

        let captured = Captured::default();
        let subscriber = tracing_subscriber::registry().with(captured.clone());
        let (_bridge, dispatcher) = setup();
        let call = MethodCall::new("deleteSms").with_argument(ARG_ID, "12");

        tracing::subscriber::with_default(subscriber, || {
            dispatcher.dispatch_on(SMS, &call);
            dispatcher.dispatch(&call);
        });

        let events = captured.0.lock().unwrap();
        let received: Vec<_> = events
            .iter()
            .filter(|e| e.contains("received method call"))
            .collect();
        assert_eq!(received.len(), 2);
        for event in received {
            assert!(event.contains("deleteSms"), "{event}");
            assert!(event.contains(r#""id": String("12")"#), "{event}");
        }
    }

    #[test]
    fn faults_never_reach_the_channel() {
        let (bridge, dispatcher) = setup();
        bridge.fail_with(Some(AccessFault::Unavailable("telephony service down".into())));

        assert_eq!(
            dispatcher.dispatch_on(DEVICE, &MethodCall::new("getSimInfo")),
            MethodResult::Success(Outcome::Subscriptions(Vec::new()))
        );
        assert_eq!(
            dispatcher.dispatch_on(DEVICE, &MethodCall::new("getDeviceId")),
            MethodResult::Success(Outcome::DeviceId(None))
        );
        let lookup = MethodCall::new("getSmsSubscriptionId").with_argument(ARG_MESSAGE_ID, "1");
        assert_eq!(
            dispatcher.dispatch_on(SMS, &lookup),
            MethodResult::Success(Outcome::SubscriptionId(-1))
        );
    }

    #[test]
    fn reply_wire_format() {
        let ok = MethodResult::Success(Outcome::Deleted(true));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"status": "success", "value": true})
        );
        assert_eq!(
            serde_json::to_value(MethodResult::NotImplemented).unwrap(),
            json!({"status": "notImplemented"})
        );
        assert_eq!(
            serde_json::to_value(MethodResult::Success(Outcome::DeviceId(None))).unwrap(),
            json!({"status": "success", "value": null})
        );
    }

    #[test]
    fn envelope_parses_flattened_call() {
        let envelope: Envelope = serde_json::from_value(json!({
            "channel": SMS,
            "method": "deleteSms",
            "arguments": {"id": "4"}
        }))
        .unwrap();
        assert_eq!(envelope.call.message_id(ARG_ID), Some(MessageId::new("4")));

        let bare: Envelope =
            serde_json::from_value(json!({"channel": DEVICE, "method": "getSimInfo"})).unwrap();
        assert!(bare.call.arguments.is_empty());
    }

    #[test]
    fn every_operation_round_trips_its_name() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_method_name(op.method_name()), Some(op));
        }
        assert_eq!(Operation::from_method_name("notAMethod"), None);
    }
}
