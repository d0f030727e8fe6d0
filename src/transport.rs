//! The collective-communication abstraction (`spec.md` §5) standing in for
//! an external MPI binding. `broadcast`/`scatter_v`/`all_gather_v` mirror
//! `original_source/src/mpi/mpi_distribute.c` and `mpi_solve.c`'s
//! `MPI_Bcast`/`MPI_Scatterv`/`MPI_Allgatherv` calls; a production
//! deployment wires a real `mpi`-crate-backed `Transport` behind the same
//! trait (out of scope here, per `spec.md` §1).

use crate::error::TransportError;
use std::sync::{Arc, Barrier, Mutex};

/// Rank `r`'s row range under the simplified contiguous block-row
/// partition (`spec.md` §5): `base = n / size`, `rem = n mod size`.
pub fn row_range(n: usize, size: usize, rank: usize) -> (usize, usize) {
    let base = n / size;
    let rem = n % size;
    let start = rank * base + rank.min(rem);
    let end = start + base + if rank < rem { 1 } else { 0 };
    (start, end)
}

pub trait Transport {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Broadcasts `buf` from `root` to every participant; every rank's
    /// `buf` is overwritten with the root's contents on return.
    fn broadcast(&self, buf: &mut [f64], root: usize) -> Result<(), TransportError>;

    /// Scatters `send_buf` (only meaningful on `root`, full-length
    /// `counts.sum()`) into this rank's `recv_buf` (length `counts[rank]`).
    fn scatter_v(
        &self,
        send_buf: &[f64],
        counts: &[usize],
        recv_buf: &mut [f64],
        root: usize,
    ) -> Result<(), TransportError>;

    /// Gathers every rank's `send_buf` into `recv_buf` (length
    /// `counts.sum()`) on every participant (an "allgatherv").
    fn all_gather_v(
        &self,
        send_buf: &[f64],
        counts: &[usize],
        recv_buf: &mut [f64],
    ) -> Result<(), TransportError>;
}

/// The default, single-process transport: every collective is a no-op
/// copy. `size() == 1` always.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialTransport;

impl Transport for SerialTransport {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn broadcast(&self, _buf: &mut [f64], root: usize) -> Result<(), TransportError> {
        if root != 0 {
            return Err(TransportError::InvalidRoot { root, size: 1 });
        }
        Ok(())
    }

    fn scatter_v(
        &self,
        send_buf: &[f64],
        counts: &[usize],
        recv_buf: &mut [f64],
        root: usize,
    ) -> Result<(), TransportError> {
        if root != 0 {
            return Err(TransportError::InvalidRoot { root, size: 1 });
        }
        if counts.len() != 1 || send_buf.len() != counts[0] || recv_buf.len() != counts[0] {
            return Err(TransportError::BufferLengthMismatch {
                op: "scatter_v",
                expected: send_buf.len(),
                actual: recv_buf.len(),
            });
        }
        recv_buf.copy_from_slice(send_buf);
        Ok(())
    }

    fn all_gather_v(
        &self,
        send_buf: &[f64],
        counts: &[usize],
        recv_buf: &mut [f64],
    ) -> Result<(), TransportError> {
        if counts.len() != 1 || send_buf.len() != counts[0] || recv_buf.len() != counts[0] {
            return Err(TransportError::BufferLengthMismatch {
                op: "all_gather_v",
                expected: send_buf.len(),
                actual: recv_buf.len(),
            });
        }
        recv_buf.copy_from_slice(send_buf);
        Ok(())
    }
}

/// Shared rendezvous state for a `ThreadTransport` group: participants
/// synchronize via a barrier and exchange data through a mutex-guarded
/// scratch buffer, giving each collective real happens-before ordering
/// across OS threads without an external MPI library.
struct TransportHub {
    size: usize,
    barrier: Barrier,
    scratch: Mutex<Vec<f64>>,
}

/// An in-process stand-in for a real MPI communicator, built from
/// `size` threads sharing a `TransportHub` (`spec.md` §5's distributed
/// paths, exercised without a real MPI dependency).
pub struct ThreadTransport {
    rank: usize,
    hub: Arc<TransportHub>,
}

impl ThreadTransport {
    /// Builds `size` handles, one per rank, sharing a single hub. Hand
    /// each handle to its own `std::thread::spawn` closure.
    pub fn group(size: usize) -> Vec<ThreadTransport> {
        let hub = Arc::new(TransportHub {
            size,
            barrier: Barrier::new(size),
            scratch: Mutex::new(Vec::new()),
        });
        (0..size)
            .map(|rank| ThreadTransport { rank, hub: Arc::clone(&hub) })
            .collect()
    }

}

impl Transport for ThreadTransport {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.hub.size
    }

    fn broadcast(&self, buf: &mut [f64], root: usize) -> Result<(), TransportError> {
        if root >= self.hub.size {
            return Err(TransportError::InvalidRoot { root, size: self.hub.size });
        }
        self.hub.barrier.wait();
        if self.rank == root {
            let mut scratch = self.hub.scratch.lock().unwrap();
            *scratch = buf.to_vec();
        }
        self.hub.barrier.wait();
        {
            let scratch = self.hub.scratch.lock().unwrap();
            if scratch.len() != buf.len() {
                return Err(TransportError::BufferLengthMismatch {
                    op: "broadcast",
                    expected: buf.len(),
                    actual: scratch.len(),
                });
            }
            buf.copy_from_slice(&scratch);
        }
        self.hub.barrier.wait();
        Ok(())
    }

    fn scatter_v(
        &self,
        send_buf: &[f64],
        counts: &[usize],
        recv_buf: &mut [f64],
        root: usize,
    ) -> Result<(), TransportError> {
        if counts.len() != self.hub.size {
            return Err(TransportError::ParticipantMismatch {
                expected: self.hub.size,
                actual: counts.len(),
            });
        }
        if recv_buf.len() != counts[self.rank] {
            return Err(TransportError::BufferLengthMismatch {
                op: "scatter_v",
                expected: counts[self.rank],
                actual: recv_buf.len(),
            });
        }

        self.hub.barrier.wait();
        if self.rank == root {
            let mut scratch = self.hub.scratch.lock().unwrap();
            *scratch = send_buf.to_vec();
        }
        self.hub.barrier.wait();
        {
            let scratch = self.hub.scratch.lock().unwrap();
            let displ: usize = counts[..self.rank].iter().sum();
            recv_buf.copy_from_slice(&scratch[displ..displ + counts[self.rank]]);
        }
        self.hub.barrier.wait();
        Ok(())
    }

    fn all_gather_v(
        &self,
        send_buf: &[f64],
        counts: &[usize],
        recv_buf: &mut [f64],
    ) -> Result<(), TransportError> {
        if counts.len() != self.hub.size {
            return Err(TransportError::ParticipantMismatch {
                expected: self.hub.size,
                actual: counts.len(),
            });
        }
        if send_buf.len() != counts[self.rank] {
            return Err(TransportError::BufferLengthMismatch {
                op: "all_gather_v",
                expected: counts[self.rank],
                actual: send_buf.len(),
            });
        }
        let total: usize = counts.iter().sum();
        if recv_buf.len() != total {
            return Err(TransportError::BufferLengthMismatch {
                op: "all_gather_v",
                expected: total,
                actual: recv_buf.len(),
            });
        }

        self.hub.barrier.wait();
        {
            let mut scratch = self.hub.scratch.lock().unwrap();
            if scratch.len() != total {
                *scratch = vec![0.0; total];
            }
            let displ: usize = counts[..self.rank].iter().sum();
            scratch[displ..displ + counts[self.rank]].copy_from_slice(send_buf);
        }
        self.hub.barrier.wait();
        {
            let scratch = self.hub.scratch.lock().unwrap();
            recv_buf.copy_from_slice(&scratch);
        }
        self.hub.barrier.wait();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn row_range_covers_n_exactly_once() {
        let n = 17;
        let size = 4;
        let mut covered = vec![false; n];
        for rank in 0..size {
            let (start, end) = row_range(n, size, rank);
            for i in start..end {
                assert!(!covered[i], "row {i} covered twice");
                covered[i] = true;
            }
        }
        assert!(covered.iter().all(|&c| c));
    }

    #[test]
    fn serial_transport_round_trips() {
        let t = SerialTransport;
        let mut buf = vec![1.0, 2.0, 3.0];
        t.broadcast(&mut buf, 0).unwrap();
        assert_eq!(buf, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn thread_transport_broadcast_matches_root() {
        let group = ThreadTransport::group(3);
        let handles: Vec<_> = group
            .into_iter()
            .enumerate()
            .map(|(rank, t)| {
                thread::spawn(move || {
                    let mut buf = if rank == 0 { vec![9.0, 8.0] } else { vec![0.0, 0.0] };
                    t.broadcast(&mut buf, 0).unwrap();
                    buf
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), vec![9.0, 8.0]);
        }
    }

    #[test]
    fn thread_transport_all_gather_v_assembles_full_vector() {
        let n = 10;
        let size = 3;
        let counts: Vec<usize> = (0..size).map(|r| {
            let (s, e) = row_range(n, size, r);
            e - s
        }).collect();

        let group = ThreadTransport::group(size);
        let handles: Vec<_> = group
            .into_iter()
            .enumerate()
            .map(|(rank, t)| {
                let counts = counts.clone();
                thread::spawn(move || {
                    let (start, end) = row_range(n, size, rank);
                    let send: Vec<f64> = (start..end).map(|i| i as f64).collect();
                    let mut recv = vec![0.0; n];
                    t.all_gather_v(&send, &counts, &mut recv).unwrap();
                    recv
                })
            })
            .collect();
        let expected: Vec<f64> = (0..n).map(|i| i as f64).collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    }
}
