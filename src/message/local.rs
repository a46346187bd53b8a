use crossbeam_channel::{Receiver, Sender};
use super::comm::Communicator;

/// A communicator between threads of one process, where each thread plays
/// the part of a rank. Messages travel over unbounded channels, so `send`
/// never blocks.
///
pub struct LocalCommunicator {
    rank: usize,
    peers: Vec<Sender<Vec<u8>>>,
    inbox: Receiver<Vec<u8>>,
}

impl LocalCommunicator {
    /// Create a connected group of `size` communicators, in rank order. Each
    /// one is meant to be moved to its own thread.
    ///
    pub fn group(size: usize) -> Vec<Self> {
        let (peers, inboxes): (Vec<_>, Vec<_>) = (0..size)
            .map(|_| crossbeam_channel::unbounded())
            .unzip();

        inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| Self {
                rank,
                peers: peers.clone(),
                inbox,
            })
            .collect()
    }
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.peers.len()
    }

    fn send(&self, rank: usize, message: Vec<u8>) {
        if self.peers[rank].send(message).is_err() {
            log::error!("rank {} dropped a message to departed rank {}", self.rank, rank);
        }
    }

    fn recv(&self) -> Vec<u8> {
        match self.inbox.recv() {
            Ok(message) => message,
            Err(_) => panic!("rank {} is waiting on a message that can never arrive", self.rank),
        }
    }
}

/// The communicator of a serial run: a group of one. Collective operations
/// return their input without sending anything.
///
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn send(&self, rank: usize, _: Vec<u8>) {
        unreachable!("a single process has no peer {}", rank)
    }

    fn recv(&self) -> Vec<u8> {
        unreachable!("a single process has no peers to receive from")
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use std::thread;
    use super::{LocalCommunicator, SingleProcess};
    use crate::message::comm::Communicator;

    #[test]
    fn max_is_reduced_across_ranks() {
        for size in [1, 2, 3, 5, 8] {
            let handles: Vec<_> = LocalCommunicator::group(size)
                .into_iter()
                .map(|comm| thread::spawn(move || {
                    let local = (comm.rank() as f64 * 7.0) % 5.0;
                    comm.all_reduce_max(local).unwrap()
                }))
                .collect();

            let expected = (0..size).map(|r| (r as f64 * 7.0) % 5.0).fold(f64::MIN, f64::max);

            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        }
    }

    #[test]
    fn repeated_reductions_do_not_interfere() {
        let handles: Vec<_> = LocalCommunicator::group(4)
            .into_iter()
            .map(|comm| thread::spawn(move || {
                (0..10)
                    .map(|n| comm.all_reduce_min((comm.rank() + n) as f64).unwrap())
                    .collect::<Vec<_>>()
            }))
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), (0..10).map(|n| n as f64).collect::<Vec<_>>());
        }
    }

    #[test]
    fn single_process_reduction_is_the_identity() {
        assert_eq!(SingleProcess.all_reduce_max(3.5).unwrap(), 3.5);
    }
}
