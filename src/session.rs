// src/session.rs
//! Sampling, geofencing and notification cycle

use crate::{
    geofence::{self, GeofenceResult, Waypoint},
    gps::{data::Position, sampler::FixSampler},
    notify::{Notification, Notifier},
};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    time::sleep,
};

/// Place the session currently considers itself at
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub last_place: Option<String>,
}

impl SessionState {
    /// Apply one cycle's sample and return the next state together with the
    /// notifications it produces.
    ///
    /// Every position is reported. Entering a waypoint that differs from the
    /// current one adds an arrival; staying inside it adds nothing. Leaving
    /// all waypoints clears the current place without a notification. A
    /// missing position leaves the state untouched.
    pub fn advance(
        &self,
        position: Option<&Position>,
        waypoints: &[Waypoint],
        single_shot: bool,
    ) -> (SessionState, Vec<Notification>) {
        let Some(pos) = position else {
            let no_fix = if single_shot {
                Notification::NoSignal
            } else {
                Notification::NoReliableFix
            };
            return (self.clone(), vec![no_fix]);
        };

        let mut notifications = vec![Notification::from(pos)];

        let next = match geofence::check_location(pos.latitude, pos.longitude, waypoints) {
            GeofenceResult::Inside { name, distance_m } => {
                if self.last_place.as_deref() != Some(name.as_str()) {
                    log::info!("Entered {} ({:.1} m from center)", name, distance_m);
                    notifications.push(Notification::Arrived(name.clone()));
                }
                SessionState {
                    last_place: Some(name),
                }
            }
            GeofenceResult::Outside { nearest } => {
                if let Some(n) = nearest {
                    log::debug!("Outside all waypoints, nearest {} at {:.1} m", n.name, n.distance_m);
                }
                SessionState::default()
            }
        };

        (next, notifications)
    }
}

/// Drives sampler, geofence and notifier on a fixed cadence
pub struct Session<R, W> {
    sampler: FixSampler<R>,
    notifier: Notifier<W>,
    waypoints: Vec<Waypoint>,
    state: SessionState,
    interval: Duration,
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(
        sampler: FixSampler<R>,
        notifier: Notifier<W>,
        waypoints: Vec<Waypoint>,
        interval: Duration,
    ) -> Self {
        Self {
            sampler,
            notifier,
            waypoints,
            state: SessionState::default(),
            interval,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn notifier(&self) -> &Notifier<W> {
        &self.notifier
    }

    /// A single sample per cycle reproduces the unfiltered forwarder
    pub fn is_single_shot(&self) -> bool {
        self.sampler.settings().sample_count == 1
    }

    /// Run one sample/evaluate/notify cycle
    pub async fn run_cycle(&mut self) -> Vec<Notification> {
        let position = self.sampler.sample().await;
        let (next, notifications) =
            self.state
                .advance(position.as_ref(), &self.waypoints, self.is_single_shot());

        for notification in &notifications {
            self.notifier.send(notification).await;
        }

        self.state = next;
        notifications
    }

    /// Announce start-up, then cycle until `running` is cleared
    pub async fn run(&mut self, running: Arc<AtomicBool>) {
        log::info!(
            "Session started with {} waypoints, {:?} between cycles",
            self.waypoints.len(),
            self.interval
        );
        self.notifier.send(&Notification::Started).await;

        while running.load(Ordering::Relaxed) {
            self.run_cycle().await;
            sleep(self.interval).await;
        }

        log::info!("Session stopped");
    }
}
