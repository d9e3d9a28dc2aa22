// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Channel mesh between worker threads
//!
//! Every ordered pair of workers gets its own channel, so messages from
//! one peer always arrive in the order they were sent regardless of how
//! far ahead another peer has run.
//!
//! The all-reduce is an all-to-all exchange: each worker sends its local
//! array to every peer, then folds the contributions in rank order. All
//! workers fold the same arrays in the same order, so their results are
//! bit-identical.

use super::Collective;
use crate::error::CollectiveError;
use crate::state::{Body, Force};
use std::sync::mpsc::{channel, Receiver, Sender};

enum Message {
    Bodies(Vec<Body>),
    Forces(Vec<Force>),
}

/// Factory for a fully connected group of [`ChannelEndpoint`]s
pub struct ChannelGroup;

impl ChannelGroup {
    /// Create `size` connected endpoints, indexed by rank
    ///
    /// Move each endpoint onto its own thread before running collectives.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn create(size: usize) -> Vec<ChannelEndpoint> {
        assert!(size > 0, "Worker group must have at least one member");

        let mut outgoing: Vec<Vec<Option<Sender<Message>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
        let mut incoming: Vec<Vec<Option<Receiver<Message>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();

        for source in 0..size {
            for destination in 0..size {
                if source != destination {
                    let (tx, rx) = channel();
                    outgoing[source][destination] = Some(tx);
                    incoming[destination][source] = Some(rx);
                }
            }
        }

        outgoing
            .into_iter()
            .zip(incoming)
            .enumerate()
            .map(|(rank, (outgoing, incoming))| ChannelEndpoint {
                rank,
                size,
                outgoing,
                incoming,
            })
            .collect()
    }
}

/// One worker's view of the channel mesh
pub struct ChannelEndpoint {
    rank: usize,
    size: usize,
    // indexed by destination rank; `None` at our own rank
    outgoing: Vec<Option<Sender<Message>>>,
    // indexed by source rank; `None` at our own rank
    incoming: Vec<Option<Receiver<Message>>>,
}

impl ChannelEndpoint {
    fn send(&self, peer: usize, message: Message) -> Result<(), CollectiveError> {
        let disconnected = CollectiveError::Disconnected { rank: self.rank, peer };
        match &self.outgoing[peer] {
            Some(tx) => tx.send(message).map_err(|_| disconnected),
            None => Err(disconnected),
        }
    }

    fn receive(&self, peer: usize) -> Result<Message, CollectiveError> {
        let disconnected = CollectiveError::Disconnected { rank: self.rank, peer };
        match &self.incoming[peer] {
            Some(rx) => rx.recv().map_err(|_| disconnected),
            None => Err(disconnected),
        }
    }

    fn receive_forces(&self, peer: usize, expected: usize) -> Result<Vec<Force>, CollectiveError> {
        match self.receive(peer)? {
            Message::Forces(forces) if forces.len() == expected => Ok(forces),
            Message::Forces(forces) => Err(CollectiveError::LengthMismatch {
                rank: self.rank,
                peer,
                expected,
                actual: forces.len(),
            }),
            Message::Bodies(_) => Err(CollectiveError::UnexpectedMessage {
                rank: self.rank,
                peer,
                expected: "forces",
            }),
        }
    }
}

impl Collective for ChannelEndpoint {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn broadcast_bodies(&mut self, root: usize, bodies: &mut Vec<Body>) -> Result<(), CollectiveError> {
        if root >= self.size {
            return Err(CollectiveError::InvalidRoot { root, size: self.size });
        }

        if self.rank == root {
            for peer in (0..self.size).filter(|&peer| peer != root) {
                self.send(peer, Message::Bodies(bodies.clone()))?;
            }
            return Ok(());
        }

        match self.receive(root)? {
            Message::Bodies(received) => {
                *bodies = received;
                Ok(())
            }
            Message::Forces(_) => Err(CollectiveError::UnexpectedMessage {
                rank: self.rank,
                peer: root,
                expected: "bodies",
            }),
        }
    }

    fn all_reduce<F>(&mut self, local: &[Force], out: &mut [Force], combine: F) -> Result<(), CollectiveError>
    where
        F: Fn(&[Force], &mut [Force]) + Sync,
    {
        if out.len() != local.len() {
            return Err(CollectiveError::LengthMismatch {
                rank: self.rank,
                peer: self.rank,
                expected: local.len(),
                actual: out.len(),
            });
        }

        for peer in (0..self.size).filter(|&peer| peer != self.rank) {
            self.send(peer, Message::Forces(local.to_vec()))?;
        }

        for source in 0..self.size {
            let received;
            let contribution: &[Force] = if source == self.rank {
                local
            } else {
                received = self.receive_forces(source, local.len())?;
                &received
            };

            if source == 0 {
                out.copy_from_slice(contribution);
            } else {
                combine(contribution, out);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collective::sum_forces;
    use crate::state::{Position, Velocity};
    use std::thread;

    #[test]
    fn test_single_member_reduce_is_identity() {
        let mut endpoints = ChannelGroup::create(1);
        let endpoint = &mut endpoints[0];
        let local = vec![Force::new(1.0, 2.0), Force::new(3.0, 4.0)];
        let mut out = vec![Force::zero(); 2];

        endpoint.all_reduce(&local, &mut out, sum_forces).unwrap();
        assert_eq!(out, local);
        assert_eq!(endpoint.rank(), 0);
        assert_eq!(endpoint.size(), 1);
    }

    #[test]
    fn test_all_reduce_sums_on_every_worker() {
        let size = 4;
        let endpoints = ChannelGroup::create(size);

        let results: Vec<Vec<Force>> = thread::scope(|scope| {
            let handles: Vec<_> = endpoints
                .into_iter()
                .map(|mut endpoint| {
                    scope.spawn(move || {
                        let rank = endpoint.rank() as f64;
                        let local = vec![Force::new(rank, 1.0), Force::new(0.1 * rank, -rank)];
                        let mut out = vec![Force::zero(); 2];
                        endpoint.all_reduce(&local, &mut out, sum_forces).unwrap();
                        out
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for out in &results {
            assert_eq!(out[0], Force::new(6.0, 4.0));
            assert!((out[1].fx - 0.6).abs() < 1e-12);
            assert_eq!(out[1].fy, -6.0);
            // identical fold order on every worker
            assert_eq!(out, &results[0]);
        }
    }

    #[test]
    fn test_repeated_reductions_stay_in_order() {
        let size = 3;
        let rounds = 50;
        let endpoints = ChannelGroup::create(size);

        thread::scope(|scope| {
            for mut endpoint in endpoints {
                scope.spawn(move || {
                    for round in 0..rounds {
                        let local = vec![Force::new(round as f64, endpoint.rank() as f64)];
                        let mut out = vec![Force::zero()];
                        endpoint.all_reduce(&local, &mut out, sum_forces).unwrap();
                        assert_eq!(out[0], Force::new(3.0 * round as f64, 3.0));
                    }
                });
            }
        });
    }

    #[test]
    fn test_broadcast_bodies() {
        let endpoints = ChannelGroup::create(3);
        let source = vec![
            Body::new(Position::new(1.0, 2.0), Velocity::new(0.5, 0.5), 8.0, 2.0),
            Body::new(Position::new(3.0, 4.0), Velocity::zero(), 1.0, 1.0),
        ];

        let received: Vec<Vec<Body>> = thread::scope(|scope| {
            let handles: Vec<_> = endpoints
                .into_iter()
                .map(|mut endpoint| {
                    let source = source.clone();
                    scope.spawn(move || {
                        let mut bodies = if endpoint.rank() == 1 { source } else { Vec::new() };
                        endpoint.broadcast_bodies(1, &mut bodies).unwrap();
                        bodies
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for bodies in received {
            assert_eq!(bodies, source);
        }
    }

    #[test]
    fn test_invalid_root() {
        let mut endpoints = ChannelGroup::create(2);
        let mut bodies = Vec::new();
        let err = endpoints[0].broadcast_bodies(2, &mut bodies).unwrap_err();
        assert_eq!(err, CollectiveError::InvalidRoot { root: 2, size: 2 });
    }

    #[test]
    fn test_departed_peer_is_reported() {
        let mut endpoints = ChannelGroup::create(2);
        drop(endpoints.pop());

        let local = vec![Force::zero()];
        let mut out = vec![Force::zero()];
        let err = endpoints[0].all_reduce(&local, &mut out, sum_forces).unwrap_err();
        assert_eq!(err, CollectiveError::Disconnected { rank: 0, peer: 1 });
    }

    #[test]
    fn test_output_length_is_checked() {
        let mut endpoints = ChannelGroup::create(1);
        let mut out = vec![Force::zero(); 3];
        let err = endpoints[0]
            .all_reduce(&[Force::zero()], &mut out, sum_forces)
            .unwrap_err();
        assert!(matches!(err, CollectiveError::LengthMismatch { expected: 1, actual: 3, .. }));
    }
}
