use std::sync::{Arc, Mutex};

use tenrs::engine::spec::{
    Device, Engine, EngineResult, IndexSpec, Operation, TensorInit, TensorLiteral, TensorSpec,
};

/// Test-only engine that forwards every call to an inner engine while
/// recording the sequence of primitive-operation descriptors it receives.
///
/// Dispatch contracts are asserted structurally against this log: e.g.
/// `not_equal` must record `[Elemwise Eq, TypeCvt Bool, Elemwise Not]`.
pub struct RecordingEngine<E: Engine + 'static> {
    inner: Arc<E>,
    operations: Mutex<Vec<Operation>>,
}

impl<E: Engine + 'static> RecordingEngine<E> {
    pub fn new(inner: Arc<E>) -> Self {
        RecordingEngine {
            inner,
            operations: Mutex::new(Vec::new()),
        }
    }

    /// Returns the descriptors recorded so far, oldest first.
    pub fn recorded_ops(&self) -> Vec<Operation> {
        self.operations
            .lock()
            .expect("recording mutex poisoned")
            .clone()
    }

    /// Drops the recorded history; useful between assertions.
    pub fn clear(&self) {
        self.operations
            .lock()
            .expect("recording mutex poisoned")
            .clear();
    }
}

impl<E: Engine + 'static> Engine for RecordingEngine<E> {
    type Handle = E::Handle;

    fn engine_name(&self) -> &str {
        "recording"
    }

    fn materialize(&self, init: TensorInit, device: Device) -> EngineResult<Self::Handle> {
        self.inner.materialize(init, device)
    }

    fn to_literal(&self, handle: &Self::Handle) -> EngineResult<TensorLiteral> {
        self.inner.to_literal(handle)
    }

    fn spec_of(&self, handle: &Self::Handle) -> TensorSpec {
        self.inner.spec_of(handle)
    }

    fn device_of(&self, handle: &Self::Handle) -> Device {
        self.inner.device_of(handle)
    }

    fn apply(&self, op: &Operation, inputs: &[Self::Handle]) -> EngineResult<Vec<Self::Handle>> {
        self.operations
            .lock()
            .expect("recording mutex poisoned")
            .push(op.clone());
        self.inner.apply(op, inputs)
    }

    fn index_read(&self, handle: &Self::Handle, index: &IndexSpec) -> EngineResult<Self::Handle> {
        self.inner.index_read(handle, index)
    }

    fn index_write(
        &self,
        handle: &Self::Handle,
        index: &IndexSpec,
        value: &Self::Handle,
    ) -> EngineResult<Self::Handle> {
        self.inner.index_write(handle, index, value)
    }
}
