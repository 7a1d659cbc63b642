//! Function identities, declared parameters, and argument binding.
//!
//! Binding maps a call's positional and named arguments onto the declared
//! parameters and fills in defaults, so that every way of spelling the same
//! call produces the same [`BoundArgs`].

use std::fmt;

use dfcache_common::ContentHasher;

use crate::error::BindError;
use crate::value::Value;

/// Hex digits of the identity hash appended to artifact names.
const ARTIFACT_NAME_HASH_LEN: usize = 8;

/// Identity of a wrapped function: the module it lives in plus its
/// qualified name within that module (e.g. `Report.daily`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionId {
    module: String,
    qualname: String,
}

impl FunctionId {
    /// Creates an identity from a module path and a qualified name.
    pub fn new(module: impl Into<String>, qualname: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            qualname: qualname.into(),
        }
    }

    /// Returns the module path.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Returns the qualified name within the module.
    pub fn qualname(&self) -> &str {
        &self.qualname
    }

    /// Returns `module.qualname`, the form hashed into fingerprints.
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.module, self.qualname)
    }

    /// Returns the filesystem-safe name used as the artifact file prefix.
    ///
    /// `module_qualname` with every character other than ASCII alphanumerics
    /// and `_` replaced by `_`, followed by `_` and a short hash of the
    /// unsanitized module and qualname. Sanitizing alone maps `pkg.mod` and
    /// `pkg_mod` to the same text; the hash keeps their artifacts apart.
    pub fn artifact_name(&self) -> String {
        let readable: String = format!("{}_{}", self.module, self.qualname)
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        let digest = self.identity_hash().to_string();
        format!("{readable}_{}", &digest[..ARTIFACT_NAME_HASH_LEN])
    }

    fn identity_hash(&self) -> dfcache_common::ContentHash {
        let mut hasher = ContentHasher::new();
        hasher.update(&(self.module.len() as u64).to_le_bytes());
        hasher.update(self.module.as_bytes());
        hasher.update(self.qualname.as_bytes());
        hasher.finish()
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.qualname)
    }
}

/// How a parameter participates in fingerprinting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// The implicit receiver of a method (`self`). Bound and passed to the
    /// computation, but never hashed.
    Receiver,
    /// An ordinary parameter.
    Regular,
}

/// A declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    name: String,
    kind: ParamKind,
    default: Option<Value>,
}

impl Param {
    /// Returns the parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parameter kind.
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Returns the default value, if declared.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// The declared shape of a wrapped function.
///
/// ```
/// use dfcache::{FunctionId, Signature};
///
/// let sig = Signature::new(FunctionId::new("reports", "Sales.by_region"))
///     .receiver("self")
///     .param("region")
///     .param_with_default("limit", 100);
/// assert_eq!(sig.params().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    function: FunctionId,
    params: Vec<Param>,
}

impl Signature {
    /// Creates a signature with no parameters.
    pub fn new(function: FunctionId) -> Self {
        Self {
            function,
            params: Vec::new(),
        }
    }

    /// Declares the method receiver. Must come first.
    pub fn receiver(self, name: impl Into<String>) -> Self {
        self.push(name.into(), ParamKind::Receiver, None)
    }

    /// Declares a required parameter.
    pub fn param(self, name: impl Into<String>) -> Self {
        self.push(name.into(), ParamKind::Regular, None)
    }

    /// Declares a parameter with a default value.
    pub fn param_with_default(self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.push(name.into(), ParamKind::Regular, Some(default.into()))
    }

    fn push(mut self, name: String, kind: ParamKind, default: Option<Value>) -> Self {
        self.params.push(Param {
            name,
            kind,
            default,
        });
        self
    }

    /// Returns the function identity.
    pub fn function(&self) -> &FunctionId {
        &self.function
    }

    /// Returns the declared parameters in order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Checks that parameter names are unique and that a receiver, if any,
    /// is the first parameter.
    pub fn validate(&self) -> Result<(), BindError> {
        for (i, p) in self.params.iter().enumerate() {
            if self.params[..i].iter().any(|q| q.name() == p.name()) {
                return Err(BindError::DuplicateParameter {
                    function: self.function.qualified(),
                    name: p.name().to_string(),
                });
            }
            if p.kind() == ParamKind::Receiver && i != 0 {
                return Err(BindError::MisplacedReceiver {
                    function: self.function.qualified(),
                    name: p.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Binds call arguments to parameters, applying defaults.
    ///
    /// Positional arguments fill parameters in declaration order (the
    /// receiver included); named arguments fill by name.
    pub fn bind(&self, args: CallArgs) -> Result<BoundArgs, BindError> {
        let function = || self.function.qualified();

        if args.positional.len() > self.params.len() {
            return Err(BindError::TooManyPositional {
                function: function(),
                expected: self.params.len(),
                given: args.positional.len(),
            });
        }

        let mut slots: Vec<Option<Value>> = vec![None; self.params.len()];
        for (slot, value) in slots.iter_mut().zip(args.positional) {
            *slot = Some(value);
        }

        for (name, value) in args.named {
            let Some(idx) = self.params.iter().position(|p| p.name() == name) else {
                return Err(BindError::UnknownArgument {
                    function: function(),
                    name,
                });
            };
            if slots[idx].is_some() {
                return Err(BindError::DuplicateArgument {
                    function: function(),
                    name,
                });
            }
            slots[idx] = Some(value);
        }

        let mut entries = Vec::with_capacity(self.params.len());
        for (param, slot) in self.params.iter().zip(slots) {
            let value = match slot.or_else(|| param.default().cloned()) {
                Some(v) => v,
                None => {
                    return Err(BindError::MissingArgument {
                        function: function(),
                        name: param.name().to_string(),
                    })
                }
            };
            entries.push(BoundArg {
                name: param.name().to_string(),
                kind: param.kind(),
                value,
            });
        }

        Ok(BoundArgs { entries })
    }
}

/// The arguments of one call, as the caller wrote them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
}

impl CallArgs {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Appends a named argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.push((name.into(), value.into()));
        self
    }
}

/// One parameter with its bound value.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArg {
    name: String,
    kind: ParamKind,
    value: Value,
}

impl BoundArg {
    /// Returns the parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parameter kind.
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Returns the bound value.
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Every declared parameter paired with its effective value, in
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArgs {
    entries: Vec<BoundArg>,
}

impl BoundArgs {
    /// Looks up a bound value by parameter name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.iter().find(|e| e.name == name).map(|e| &e.value)
    }

    /// Returns the receiver's value, if the signature declares one.
    pub fn receiver(&self) -> Option<&Value> {
        self.iter()
            .find(|e| e.kind == ParamKind::Receiver)
            .map(|e| &e.value)
    }

    /// Iterates over all bound parameters, the receiver included.
    pub fn iter(&self) -> impl Iterator<Item = &BoundArg> {
        self.entries.iter()
    }

    /// Iterates over the parameters that contribute to the fingerprint.
    pub fn hashed(&self) -> impl Iterator<Item = &BoundArg> {
        self.iter().filter(|e| e.kind != ParamKind::Receiver)
    }
}
