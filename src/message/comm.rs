use serde::{de::DeserializeOwned, Serialize};
use crate::error::Error;
use super::util;

/// Interface for a group of processes (or threads standing in for them)
/// that exchange messages. The underlying transport can in principle be
/// channels, TCP, or a higher level abstraction like MPI. Collective
/// operations are provided on top of `send` and `recv`.
///
pub trait Communicator {
    /// Must be implemented to return the rank of this process within the
    /// communicator.
    fn rank(&self) -> usize;

    /// Must be implemented to return the number of peer processes in this
    /// communicator.
    fn size(&self) -> usize;

    /// Must be implemented to send a message to a peer. This method must
    /// return immediately, in other words it is not allowed to block until a
    /// matching receive is posted.
    fn send(&self, rank: usize, message: Vec<u8>);

    /// Must be implemented to receive a message from any of the peers. This
    /// method is allowed to block until a message is ready to be received.
    fn recv(&self) -> Vec<u8>;

    /// Implements a binomial tree broadcast from rank 0. The message buffer
    /// must be `Some` on rank 0, and `None` otherwise.
    ///
    fn broadcast(&self, value: Option<Vec<u8>>) -> Vec<u8> {
        let r = self.rank();
        let p = self.size();

        let value = match value {
            Some(value) => value,
            None => self.recv(),
        };
        for level in (0..util::ceil_log2(p)).rev() {
            let one = 1 << level;
            let two = 1 << (level + 1);

            if r % two == 0 && r + one < p {
                self.send(r + one, value.clone())
            }
        }
        value
    }

    /// Implements a binomial tree reduce onto rank 0. All ranks return
    /// `None` except for the root. The operator must be commutative, since
    /// contributions are folded in order of arrival.
    ///
    fn reduce<F>(&self, f: F, mut value: Vec<u8>) -> Result<Option<Vec<u8>>, Error>
    where
        F: Fn(Vec<u8>, Vec<u8>) -> Result<Vec<u8>, Error>,
    {
        let r = self.rank();
        let p = self.size();

        for level in 0..util::ceil_log2(p) {
            let one = 1 << level;
            let two = 1 << (level + 1);

            if r % two == 0 {
                if r + one < p {
                    value = f(value, self.recv())?
                }
            } else {
                self.send(r - one, value);
                return Ok(None);
            }
        }
        Ok(Some(value))
    }

    /// Implements an all-reduce (symmetric fold) operation over a commutative
    /// binary operator.
    ///
    fn all_reduce<F>(&self, f: F, value: Vec<u8>) -> Result<Vec<u8>, Error>
    where
        F: Fn(Vec<u8>, Vec<u8>) -> Result<Vec<u8>, Error>,
    {
        let reduced = self.reduce(f, value)?;
        Ok(self.broadcast(reduced))
    }

    /// All-reduce of a serializable value. Values are packed with
    /// MessagePack on the wire.
    ///
    fn all_reduce_value<T, F>(&self, f: F, value: &T) -> Result<T, Error>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(T, T) -> T,
    {
        let bytes = self.all_reduce(
            |a, b| {
                let a: T = rmp_serde::from_slice(&a)?;
                let b: T = rmp_serde::from_slice(&b)?;
                Ok(rmp_serde::to_vec(&f(a, b))?)
            },
            rmp_serde::to_vec(value)?,
        )?;
        Ok(rmp_serde::from_slice(&bytes)?)
    }

    /// Maximum of a number over all ranks.
    ///
    fn all_reduce_max(&self, value: f64) -> Result<f64, Error> {
        self.all_reduce_value(f64::max, &value)
    }

    /// Minimum of a number over all ranks.
    ///
    fn all_reduce_min(&self, value: f64) -> Result<f64, Error> {
        self.all_reduce_value(f64::min, &value)
    }
}
