//! Engine Activation
//!
//! Strategies for attaching the decision engine to an interface's
//! egress path. A real deployment uses the raw-socket or filter-object
//! backend; tests use the null activator. Whichever backend wins,
//! the returned handle owns the attachment and dropping it detaches.

use std::path::PathBuf;

use aya::programs::{Xdp, XdpFlags};
use aya::Ebpf;
use socket2::{Domain, Protocol, Socket, Type};
use tracing::debug;

use riskgate_common::{GateError, GateResult};

use crate::config::{AgentConfig, Backend};

/// Strategy for attaching the decision engine to the packet path
pub trait EngineActivator: Send + Sync {
    /// Short backend name for logs
    fn backend(&self) -> &'static str;

    /// Attempt the attach on `iface`
    fn activate(&self, iface: &str) -> GateResult<ActiveEngine>;
}

/// Handle owning an active attachment. Dropping it detaches.
pub struct ActiveEngine {
    backend: &'static str,
    _attachment: Attachment,
}

enum Attachment {
    Socket(Socket),
    Object(Ebpf),
    Inert,
}

impl ActiveEngine {
    /// Backend that produced this handle
    pub fn backend(&self) -> &'static str {
        self.backend
    }
}

impl std::fmt::Debug for ActiveEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveEngine")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

/// Attaches by binding a raw packet socket to the interface. Works on
/// stock kernels, needs CAP_NET_RAW.
pub struct SocketActivator;

impl EngineActivator for SocketActivator {
    fn backend(&self) -> &'static str {
        "socket"
    }

    fn activate(&self, iface: &str) -> GateResult<ActiveEngine> {
        let protocol = Protocol::from((libc::ETH_P_ALL as u16).to_be() as i32);
        let socket = Socket::new(Domain::PACKET, Type::RAW, Some(protocol))
            .map_err(|e| GateError::ActivationFailed(format!("raw socket: {e}")))?;
        socket
            .bind_device(Some(iface.as_bytes()))
            .map_err(|e| GateError::ActivationFailed(format!("bind to {iface}: {e}")))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| GateError::ActivationFailed(format!("set nonblocking: {e}")))?;
        debug!(iface, "raw socket bound");
        Ok(ActiveEngine {
            backend: self.backend(),
            _attachment: Attachment::Socket(socket),
        })
    }
}

/// Loads a compiled filter object and attaches its program to the
/// interface's ingress hook.
pub struct ObjectActivator {
    object_path: PathBuf,
    program: String,
}

impl ObjectActivator {
    /// Activator for the object at `object_path` containing `program`
    pub fn new(object_path: impl Into<PathBuf>, program: impl Into<String>) -> Self {
        Self {
            object_path: object_path.into(),
            program: program.into(),
        }
    }
}

impl EngineActivator for ObjectActivator {
    fn backend(&self) -> &'static str {
        "object"
    }

    fn activate(&self, iface: &str) -> GateResult<ActiveEngine> {
        let bytes = std::fs::read(&self.object_path).map_err(|e| {
            GateError::ActivationFailed(format!("read {}: {e}", self.object_path.display()))
        })?;
        let mut bpf = Ebpf::load(&bytes)
            .map_err(|e| GateError::ActivationFailed(format!("load object: {e}")))?;

        let program: &mut Xdp = bpf
            .program_mut(&self.program)
            .ok_or_else(|| {
                GateError::ActivationFailed(format!("program {} not in object", self.program))
            })?
            .try_into()
            .map_err(|e: aya::programs::ProgramError| {
                GateError::ActivationFailed(format!("program {}: {e}", self.program))
            })?;
        program
            .load()
            .map_err(|e| GateError::ActivationFailed(format!("verifier: {e}")))?;
        let _link_id = program
            .attach(iface, XdpFlags::default())
            .map_err(|e| GateError::ActivationFailed(format!("attach to {iface}: {e}")))?;
        debug!(iface, program = %self.program, "filter object attached");

        // The link lives inside `bpf`; dropping the handle detaches it.
        Ok(ActiveEngine {
            backend: self.backend(),
            _attachment: Attachment::Object(bpf),
        })
    }
}

/// Test activator. Fails by default, or hands back an inert handle
/// that owns no OS resources.
pub struct NullActivator {
    succeed: bool,
}

impl NullActivator {
    /// Activator whose `activate` always fails
    pub fn failing() -> Self {
        Self { succeed: false }
    }

    /// Activator whose `activate` always succeeds with an inert handle
    pub fn inert() -> Self {
        Self { succeed: true }
    }
}

impl EngineActivator for NullActivator {
    fn backend(&self) -> &'static str {
        "null"
    }

    fn activate(&self, iface: &str) -> GateResult<ActiveEngine> {
        if self.succeed {
            Ok(ActiveEngine {
                backend: self.backend(),
                _attachment: Attachment::Inert,
            })
        } else {
            Err(GateError::ActivationFailed(format!(
                "null activator refused {iface}"
            )))
        }
    }
}

/// Activator selected by the configuration
pub fn activator_for(config: &AgentConfig) -> Box<dyn EngineActivator> {
    match config.backend {
        Backend::Socket => Box::new(SocketActivator),
        Backend::Object => Box::new(ObjectActivator::new(
            config.object_path.clone(),
            config.object_program.clone(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_failing() {
        let err = NullActivator::failing().activate("eth0").unwrap_err();
        assert!(matches!(err, GateError::ActivationFailed(_)));
    }

    #[test]
    fn test_null_inert() {
        let active = NullActivator::inert().activate("eth0").unwrap();
        assert_eq!(active.backend(), "null");
    }

    #[test]
    fn test_socket_activation_fails_without_privileges_or_iface() {
        // Unprivileged: socket creation fails. Privileged: binding to a
        // nonexistent device fails. Either way the error is the
        // activation variant.
        let err = SocketActivator.activate("rgt-noif0").unwrap_err();
        assert!(matches!(err, GateError::ActivationFailed(_)));
    }

    #[test]
    fn test_object_activation_fails_on_missing_object() {
        let activator = ObjectActivator::new("/nonexistent/egress_filter.o", "riskgate_filter");
        let err = activator.activate("eth0").unwrap_err();
        assert!(matches!(err, GateError::ActivationFailed(_)));
    }

    #[test]
    fn test_activator_selection() {
        let mut config = AgentConfig {
            backend: Backend::Socket,
            ..AgentConfig::default()
        };
        assert_eq!(activator_for(&config).backend(), "socket");
        config.backend = Backend::Object;
        assert_eq!(activator_for(&config).backend(), "object");
    }
}
