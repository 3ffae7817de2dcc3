//! `zbus` implementation of the engine's bus boundary.
//!
//! Arguments are sent as a dynamically built structure so that the call
//! signature follows the coerced values. Replies and signal bodies are read
//! back the same way and flattened into engine values.

use futures_util::StreamExt;
use ndb_config::BusKind;
use ndb_engine::{
    Bus, BusError, Direction, InterfaceDescriptor, MethodSignature, Notification, ParameterSpec,
    SignalSignature, Subscription, Target, Value,
};
use tracing::{debug, info};
use zbus::message::Type as MessageType;
use zbus::zvariant::{self, Structure, StructureBuilder};
use zbus::{Connection, MatchRule, Message, MessageStream};
use zbus_xml::{Arg, ArgDirection, Node};

const INTROSPECTABLE_INTERFACE: &str = "org.freedesktop.DBus.Introspectable";

/// Opens bus connections.
pub(crate) trait Connector {
    type Bus: Bus;

    async fn connect(&self, kind: BusKind) -> Result<Self::Bus, BusError>;
}

pub(crate) struct ZbusConnector;

impl Connector for ZbusConnector {
    type Bus = ZbusBus;

    async fn connect(&self, kind: BusKind) -> Result<ZbusBus, BusError> {
        let connection = match kind {
            BusKind::System => Connection::system().await,
            BusKind::Session => Connection::session().await,
        }
        .map_err(BusError::new)?;
        info!(bus = %kind, "connected to message bus");
        Ok(ZbusBus { connection })
    }
}

pub(crate) struct ZbusBus {
    connection: Connection,
}

impl Bus for ZbusBus {
    type Subscription = ZbusSubscription;

    async fn introspect(&self, target: &Target) -> Result<Vec<InterfaceDescriptor>, BusError> {
        let reply = self
            .connection
            .call_method(
                Some(target.service.as_str()),
                target.path.as_str(),
                Some(INTROSPECTABLE_INTERFACE),
                "Introspect",
                &(),
            )
            .await
            .map_err(BusError::new)?;
        let xml: String = reply.body().deserialize().map_err(BusError::new)?;
        parse_introspection(&xml)
    }

    async fn call(
        &self,
        target: &Target,
        method: &str,
        arguments: &[Value],
    ) -> Result<Vec<Value>, BusError> {
        let destination = Some(target.service.as_str());
        let path = target.path.as_str();
        let interface = Some(target.interface.as_str());
        let reply = if arguments.is_empty() {
            self.connection
                .call_method(destination, path, interface, method, &())
                .await
        } else {
            let body = arguments
                .iter()
                .fold(StructureBuilder::new(), |builder, argument| {
                    builder.append_field(to_wire(argument))
                })
                .build();
            self.connection
                .call_method(destination, path, interface, method, &body)
                .await
        }
        .map_err(BusError::new)?;
        body_values(&reply)
    }

    async fn subscribe(&self, target: &Target) -> Result<ZbusSubscription, BusError> {
        let rule = MatchRule::builder()
            .msg_type(MessageType::Signal)
            .path(target.path.as_str())
            .map_err(BusError::new)?
            .interface(target.interface.as_str())
            .map_err(BusError::new)?
            .build();
        debug!(%rule, "adding match rule");
        let stream = MessageStream::for_match_rule(rule, &self.connection, None)
            .await
            .map_err(BusError::new)?;
        Ok(ZbusSubscription { stream })
    }
}

/// Signal stream backed by a match rule; dropping it removes the rule.
pub(crate) struct ZbusSubscription {
    stream: MessageStream,
}

impl Subscription for ZbusSubscription {
    async fn next(&mut self) -> Option<Result<Notification, BusError>> {
        let received = self.stream.next().await?;
        Some(
            received
                .map_err(BusError::new)
                .and_then(|message| notification(&message)),
        )
    }
}

fn notification(message: &Message) -> Result<Notification, BusError> {
    let header = message.header();
    let member = header
        .member()
        .map(ToString::to_string)
        .unwrap_or_default();
    Ok(Notification::new(member, body_values(message)?))
}

fn body_values(message: &Message) -> Result<Vec<Value>, BusError> {
    let body = message.body();
    if body
        .signature()
        .is_none_or(|signature| signature.as_str().is_empty())
    {
        return Ok(Vec::new());
    }
    let structure: Structure<'_> = body.deserialize().map_err(BusError::new)?;
    Ok(structure.into_fields().into_iter().map(from_wire).collect())
}

fn to_wire(value: &Value) -> zvariant::Value<'_> {
    match value {
        Value::Byte(byte) => zvariant::Value::U8(*byte),
        Value::Bool(flag) => zvariant::Value::Bool(*flag),
        Value::Int16(number) => zvariant::Value::I16(*number),
        Value::UInt16(number) => zvariant::Value::U16(*number),
        Value::Int32(number) => zvariant::Value::I32(*number),
        Value::UInt32(number) => zvariant::Value::U32(*number),
        Value::Int64(number) => zvariant::Value::I64(*number),
        Value::UInt64(number) => zvariant::Value::U64(*number),
        Value::Double(number) => zvariant::Value::F64(*number),
        Value::Str(text) | Value::Other(text) => zvariant::Value::from(text.as_str()),
    }
}

fn from_wire(value: zvariant::Value<'_>) -> Value {
    match value {
        zvariant::Value::U8(byte) => Value::Byte(byte),
        zvariant::Value::Bool(flag) => Value::Bool(flag),
        zvariant::Value::I16(number) => Value::Int16(number),
        zvariant::Value::U16(number) => Value::UInt16(number),
        zvariant::Value::I32(number) => Value::Int32(number),
        zvariant::Value::U32(number) => Value::UInt32(number),
        zvariant::Value::I64(number) => Value::Int64(number),
        zvariant::Value::U64(number) => Value::UInt64(number),
        zvariant::Value::F64(number) => Value::Double(number),
        zvariant::Value::Str(text) => Value::Str(text.to_string()),
        zvariant::Value::ObjectPath(path) => Value::Str(path.to_string()),
        zvariant::Value::Value(inner) => from_wire(*inner),
        other => Value::Other(other.to_string()),
    }
}

fn parse_introspection(xml: &str) -> Result<Vec<InterfaceDescriptor>, BusError> {
    let node = Node::from_reader(xml.as_bytes()).map_err(BusError::new)?;
    let interfaces = node
        .interfaces()
        .iter()
        .map(|interface| InterfaceDescriptor {
            name: interface.name().to_string(),
            methods: interface
                .methods()
                .iter()
                .map(|method| {
                    MethodSignature::new(
                        method.name().to_string(),
                        parameters(method.args(), Direction::In),
                    )
                })
                .collect(),
            signals: interface
                .signals()
                .iter()
                .map(|signal| {
                    SignalSignature::new(
                        signal.name().to_string(),
                        parameters(signal.args(), Direction::Out),
                    )
                })
                .collect(),
        })
        .collect();
    Ok(interfaces)
}

/// Signal arguments carry no direction attribute; method arguments default
/// to inputs.
fn parameters(args: &[Arg], implied: Direction) -> Vec<ParameterSpec> {
    args.iter()
        .map(|arg| ParameterSpec {
            name: arg.name().map(str::to_owned),
            direction: match arg.direction() {
                Some(ArgDirection::In) => Direction::In,
                Some(ArgDirection::Out) => Direction::Out,
                None => implied,
            },
            type_tag: arg.ty().to_string(),
        })
        .collect()
}
