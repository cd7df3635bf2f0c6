//! Sequence-protocol glue over the engine's indexing collaborators.

use crate::engine::spec::{Engine, IndexSpec};
use crate::error::{OpError, OpResult};
use crate::tensor::{HostTensor, Tensor, TensorSource};

use super::convert::{self, TensorArg};

impl<E: Engine + 'static> Tensor<E> {
    /// Extent of the first axis. Rank-0 tensors have no length.
    pub fn len(&self) -> OpResult<usize> {
        match self.shape().dims().first() {
            Some(&dim) => Ok(dim),
            None => Err(OpError::ZeroRank),
        }
    }

    pub fn is_empty(&self) -> OpResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Reads the sub-tensor selected by `index`.
    pub fn get(&self, index: impl Into<IndexSpec>) -> OpResult<Tensor<E>> {
        let handle = self.engine().index_read(self.raw(), &index.into())?;
        Ok(self.adopt(handle))
    }

    /// Writes `value` into the region selected by `index`, rebinding the
    /// wrapper with the result. A bare ellipsis replaces the whole value
    /// without touching the engine's indexing collaborator.
    pub fn set<'a>(
        &mut self,
        index: impl Into<IndexSpec>,
        value: impl Into<TensorArg<'a, E>>,
    ) -> OpResult<()> {
        let index = index.into();
        let value = value.into();
        if index.is_whole() {
            return match value {
                TensorArg::Tensor(tensor) => self.rebind(tensor),
                TensorArg::Host(host) => self.rebind(TensorSource::Host(host.clone())),
                TensorArg::Scalar(literal) => {
                    self.rebind(TensorSource::Host(HostTensor::scalar(literal)))
                }
            };
        }
        let engine = self.engine();
        let mut handle = convert::convert_inputs(&engine, &[value])?
            .pop()
            .expect("convert_inputs yields one handle per arg");
        if engine.spec_of(&handle).dtype != self.dtype() {
            handle = convert::cast(&engine, &handle, self.dtype())?;
        }
        let written = engine.index_write(self.raw(), &index, &handle)?;
        self.rebind(TensorSource::Raw(written))
    }

    /// Lazy iteration over the first axis: a fresh call restarts from
    /// index 0.
    pub fn iter(&self) -> OpResult<Rows<'_, E>> {
        Ok(Rows {
            tensor: self,
            index: 0,
            len: self.len()?,
        })
    }

    /// Membership testing is not part of the dispatch contract.
    pub fn contains<'a>(&self, _value: impl Into<TensorArg<'a, E>>) -> OpResult<bool> {
        Err(OpError::Unsupported { op: "contains" })
    }
}

/// Iterator over the first axis of a tensor, yielding one sub-tensor per
/// index.
pub struct Rows<'a, E: Engine + 'static> {
    tensor: &'a Tensor<E>,
    index: usize,
    len: usize,
}

impl<E: Engine + 'static> Iterator for Rows<'_, E> {
    type Item = OpResult<Tensor<E>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.len {
            return None;
        }
        let row = self.tensor.get(self.index as i64);
        self.index += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl<E: Engine + 'static> ExactSizeIterator for Rows<'_, E> {}
