//! Thin façade over intra-process (threads) or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees).
//! All handles are **waitable** but non-blocking: callers `.wait()` before
//! they trust that a received buffer is ready.
//!
//! Fault insertion needs exactly one collective, [`all_reduce_max`], used to
//! agree on the construction path across partitions.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};

use crate::mesh_error::MeshSieveError;

/// Non-blocking communication interface (minimal by design).
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

/// Compile-time no-op comm for serial meshes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) {}
}

// --- LocalComm: in-process ranks on separate threads ---
type Key = (usize, usize, u16); // (src, dst, tag)

#[derive(Debug, Default)]
struct Mailbox {
    slots: DashMap<Key, VecDeque<Bytes>>,
    lock: Mutex<()>,
    posted: Condvar,
}

impl Mailbox {
    fn post(&self, key: Key, payload: Bytes) {
        self.slots.entry(key).or_default().push_back(payload);
        let _guard = self.lock.lock();
        self.posted.notify_all();
    }

    fn take(&self, key: &Key) -> Option<Bytes> {
        self.slots.get_mut(key).and_then(|mut q| q.pop_front())
    }
}

/// One rank of an in-process "world" sharing a mailbox.
///
/// Build all ranks at once with [`LocalComm::world`] and move each into its
/// own thread.
#[derive(Clone, Debug)]
pub struct LocalComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
}

impl LocalComm {
    /// `size` communicators, one per rank, wired to the same mailbox.
    pub fn world(size: usize) -> Vec<LocalComm> {
        let mailbox = Arc::new(Mailbox::default());
        (0..size)
            .map(|rank| LocalComm {
                rank,
                size,
                mailbox: Arc::clone(&mailbox),
            })
            .collect()
    }
}

/// Pending receive on a [`LocalComm`].
pub struct LocalRecv {
    mailbox: Arc<Mailbox>,
    key: Key,
    len: usize,
}

impl Wait for LocalRecv {
    fn wait(self) -> Option<Vec<u8>> {
        loop {
            if let Some(bytes) = self.mailbox.take(&self.key) {
                let n = self.len.min(bytes.len());
                return Some(bytes[..n].to_vec());
            }
            let mut guard = self.mailbox.lock.lock();
            // re-check under the lock so a post between take() and here is not missed
            if self.mailbox.slots.get(&self.key).is_some_and(|q| !q.is_empty()) {
                continue;
            }
            self.mailbox
                .posted
                .wait_for(&mut guard, Duration::from_millis(10));
        }
    }
}

impl Communicator for LocalComm {
    type SendHandle = ();
    type RecvHandle = LocalRecv;

    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.size
    }

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
        self.mailbox
            .post((self.rank, peer, tag), Bytes::copy_from_slice(buf));
    }

    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> LocalRecv {
        LocalRecv {
            mailbox: Arc::clone(&self.mailbox),
            key: (peer, self.rank, tag),
            len: buf.len(),
        }
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::{Communicator, MeshSieveError, Wait};
    use mpi::environment::Universe;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    /// `MPI_COMM_WORLD` of an initialised MPI environment.
    ///
    /// Sends and receives complete eagerly; the returned handles only carry
    /// the received payload.
    pub struct MpiComm {
        _universe: Universe,
        world: SimpleCommunicator,
        rank: usize,
        size: usize,
    }

    impl MpiComm {
        /// Initialise MPI. Fails when it was already initialised.
        pub fn new() -> Result<Self, MeshSieveError> {
            let universe = mpi::initialize()
                .ok_or_else(|| MeshSieveError::Communication("MPI already initialised".into()))?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Ok(Self {
                _universe: universe,
                world,
                rank,
                size,
            })
        }
    }

    pub struct MpiRecv(Option<Vec<u8>>);

    impl Wait for MpiRecv {
        fn wait(self) -> Option<Vec<u8>> {
            self.0
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = ();
        type RecvHandle = MpiRecv;

        fn rank(&self) -> usize {
            self.rank
        }
        fn size(&self) -> usize {
            self.size
        }

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
            self.world
                .process_at_rank(peer as i32)
                .send_with_tag(buf, i32::from(tag));
        }

        fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> MpiRecv {
            let (msg, _status) = self
                .world
                .process_at_rank(peer as i32)
                .receive_vec_with_tag::<u8>(i32::from(tag));
            let n = buf.len().min(msg.len());
            buf[..n].copy_from_slice(&msg[..n]);
            MpiRecv(Some(msg))
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;

const REDUCE_TAG: u16 = 0xFA01;
const BCAST_TAG: u16 = 0xFA02;

fn decode_u64(peer: usize, payload: Option<Vec<u8>>) -> Result<u64, MeshSieveError> {
    let bytes = payload
        .ok_or_else(|| MeshSieveError::Communication(format!("no reply from rank {peer}")))?;
    if bytes.len() != std::mem::size_of::<u64>() {
        return Err(MeshSieveError::Communication(format!(
            "rank {peer} sent {} bytes, expected {}",
            bytes.len(),
            std::mem::size_of::<u64>()
        )));
    }
    Ok(bytemuck::pod_read_unaligned(&bytes))
}

/// Collective maximum of `local` over every rank of `comm`.
///
/// Gathers on rank 0 and broadcasts the result; every rank must call it.
pub fn all_reduce_max<C: Communicator>(comm: &C, local: u64) -> Result<u64, MeshSieveError> {
    let size = comm.size();
    if size <= 1 {
        return Ok(local);
    }
    let mut scratch = [0u8; 8];
    if comm.rank() == 0 {
        let pending: Vec<_> = (1..size)
            .map(|peer| (peer, comm.irecv(peer, REDUCE_TAG, &mut scratch)))
            .collect();
        let mut max = local;
        for (peer, h) in pending {
            max = max.max(decode_u64(peer, h.wait())?);
        }
        for peer in 1..size {
            comm.isend(peer, BCAST_TAG, bytemuck::bytes_of(&max)).wait();
        }
        Ok(max)
    } else {
        comm.isend(0, REDUCE_TAG, bytemuck::bytes_of(&local)).wait();
        let h = comm.irecv(0, BCAST_TAG, &mut scratch);
        decode_u64(0, h.wait())
    }
}
