//! Introspected description of the remote object's interfaces.

use serde::Serialize;

/// Direction of a method parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Supplied by the caller.
    In,
    /// Returned in the reply.
    Out,
}

/// A single parameter of a method or signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSpec {
    /// Parameter name, when introspection provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Parameter direction.
    pub direction: Direction,
    /// Signature tag of the parameter type.
    #[serde(rename = "type")]
    pub type_tag: String,
}

impl ParameterSpec {
    /// Builds an unnamed input parameter.
    #[must_use]
    pub fn input(type_tag: impl Into<String>) -> Self {
        Self {
            name: None,
            direction: Direction::In,
            type_tag: type_tag.into(),
        }
    }

    /// Builds an unnamed output parameter.
    #[must_use]
    pub fn output(type_tag: impl Into<String>) -> Self {
        Self {
            name: None,
            direction: Direction::Out,
            type_tag: type_tag.into(),
        }
    }

    /// Attaches a parameter name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A method exposed by an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSignature {
    /// Member name.
    pub name: String,
    /// Parameters in declaration order.
    pub parameters: Vec<ParameterSpec>,
}

impl MethodSignature {
    /// Creates a method signature.
    #[must_use]
    pub fn new(name: impl Into<String>, parameters: Vec<ParameterSpec>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }

    /// Input parameters in declaration order.
    pub fn inputs(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters
            .iter()
            .filter(|parameter| parameter.direction == Direction::In)
    }

    /// Number of input parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.inputs().count()
    }
}

/// A signal exposed by an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalSignature {
    /// Member name.
    pub name: String,
    /// Signal arguments; not used for matching.
    pub parameters: Vec<ParameterSpec>,
}

impl SignalSignature {
    /// Creates a signal signature.
    #[must_use]
    pub fn new(name: impl Into<String>, parameters: Vec<ParameterSpec>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }
}

/// Methods and signals published under one interface name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceDescriptor {
    /// Fully qualified interface name.
    pub name: String,
    /// Methods in introspection order.
    pub methods: Vec<MethodSignature>,
    /// Signals in introspection order.
    pub signals: Vec<SignalSignature>,
}

impl InterfaceDescriptor {
    /// Creates an empty descriptor for `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
            signals: Vec::new(),
        }
    }

    /// Appends a method.
    #[must_use]
    pub fn with_method(mut self, method: MethodSignature) -> Self {
        self.methods.push(method);
        self
    }

    /// Appends a signal.
    #[must_use]
    pub fn with_signal(mut self, signal: SignalSignature) -> Self {
        self.signals.push(signal);
        self
    }

    /// Returns true when a signal called `name` is published.
    #[must_use]
    pub fn has_signal(&self, name: &str) -> bool {
        self.signals.iter().any(|signal| signal.name == name)
    }

    /// Methods called `name`, in introspection order.
    pub fn methods_named<'s, 'n>(
        &'s self,
        name: &'n str,
    ) -> impl Iterator<Item = &'s MethodSignature> + use<'s, 'n> {
        self.methods.iter().filter(move |method| method.name == name)
    }
}
