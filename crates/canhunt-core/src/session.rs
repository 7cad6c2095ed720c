//! The game session state machine.
//!
//! A session starts in [`Phase::Countdown`] while the hiders get a head
//! start, then switches to [`Phase::Play`] for the rest of its life. Each
//! call to [`GameSession::update`] advances the simulation by one frame.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::config::GameConfig;
use crate::entity::{Can, Hider, HiderId, HiderState, Jail, Seeker};
use crate::event::GameEvent;
use crate::geometry::{circles_overlap, rotate_toward, Rect, Vec2};
use crate::hud::{Hud, JAILBREAK_BANNER};
use crate::input::Input;
use crate::snapshot::{HiderView, Light, SeekerView, Snapshot};
use crate::timer::Timers;
use crate::ConfigError;

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// Hiders get a head start; nothing moves yet.
    Countdown { remaining: f32 },
    /// The seeker is hunting.
    Play,
}

impl Phase {
    pub fn is_play(&self) -> bool {
        matches!(self, Self::Play)
    }
}

/// Work deferred to a later frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheduled {
    ExpireMessage(u64),
    Release,
}

/// One round of kick-the-can.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: GameConfig,
    phase: Phase,
    frame: u64,
    seeker: Seeker,
    hiders: Vec<Hider>,
    can: Can,
    jail: Jail,
    light: Light,
    hud: Hud,
    timers: Timers<Scheduled>,
    shown_countdown: Option<u32>,
    rng: StdRng,
}

impl GameSession {
    /// Sets up a new round. The same `seed` always produces the same
    /// hider placement and jail shuffling.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);

        let center = config.world.center();
        let can = Can {
            position: center,
            contact_radius: config.can.contact_radius,
        };
        let seeker = Seeker {
            position: center + Vec2::new(0.0, config.seeker.start_offset_y),
            velocity: Vec2::ZERO,
            speed: config.seeker.speed,
            flashlight_radius: config.seeker.flashlight_radius,
            contact_radius: config.seeker.contact_radius,
        };

        let margin = config.hiders.spawn_margin;
        let spawn_area = Rect::new(
            center,
            config.world.width - 2.0 * margin,
            config.world.height - 2.0 * margin,
        );
        let hiders = (0..config.hiders.count)
            .map(|i| {
                let position = random_point(&mut rng, &spawn_area);
                Hider::new(HiderId(i), position, config.hiders.contact_radius)
            })
            .collect();

        let jail = Jail::new(config.jail.rect(), config.jail.inset);
        let light = Light {
            center: seeker.position,
            radius: seeker.flashlight_radius,
        };

        debug!(seed, hiders = config.hiders.count, "game session created");

        Ok(Self {
            phase: Phase::Countdown {
                remaining: config.countdown_secs,
            },
            frame: 0,
            seeker,
            hiders,
            can,
            jail,
            light,
            hud: Hud::default(),
            timers: Timers::new(),
            shown_countdown: None,
            rng,
            config,
        })
    }

    /// Advances the session by one frame of length `dt` with the seeker's
    /// current key state, returning what happened.
    pub fn update(&mut self, dt: Duration, input: &Input) -> Vec<GameEvent> {
        self.frame += 1;
        let secs = dt.as_secs_f32();
        let mut events = Vec::new();

        if let Phase::Countdown { remaining } = self.phase {
            self.count_down(remaining - secs, &mut events);
            self.run_timers(dt, &mut events);
            return events;
        }

        self.seeker.velocity = input.velocity(self.seeker.speed);
        self.light.center = self.seeker.position;
        self.steer_hiders(secs);
        self.update_visibility();
        self.integrate(secs);
        self.resolve_contacts(&mut events);
        self.run_timers(dt, &mut events);

        trace!(frame = self.frame, events = events.len(), "frame simulated");
        events
    }

    fn count_down(&mut self, remaining: f32, events: &mut Vec<GameEvent>) {
        if remaining <= 0.0 {
            self.phase = Phase::Play;
            self.hud.clear_countdown();
            self.shown_countdown = None;
            info!(frame = self.frame, "countdown over, round started");
            events.push(GameEvent::RoundStarted);
            return;
        }

        self.phase = Phase::Countdown { remaining };
        let seconds_left = remaining.ceil() as u32;
        self.hud.set_countdown(seconds_left);
        if self.shown_countdown != Some(seconds_left) {
            self.shown_countdown = Some(seconds_left);
            events.push(GameEvent::CountdownTick { seconds_left });
        }
    }

    fn steer_hiders(&mut self, secs: f32) {
        let max_turn = self.config.hiders.turn_rate * secs * 1000.0;
        let speed = self.config.hiders.speed;
        let can = self.can.position;
        let holding_area = self.jail.holding_area;

        for hider in &mut self.hiders {
            match hider.state {
                HiderState::Hiding => {
                    let target = hider.position.angle_to(can);
                    hider.heading = rotate_toward(hider.heading, target, max_turn);
                    hider.velocity = Vec2::from_angle(hider.heading) * speed;
                }
                HiderState::Jailed => {
                    hider.position = random_point(&mut self.rng, &holding_area);
                    hider.velocity = Vec2::ZERO;
                }
                // Coasts on its last velocity until the jailbreak fires.
                HiderState::Freeing => {}
            }
        }
    }

    fn update_visibility(&mut self) {
        let hidden_alpha = self.config.hiders.hidden_alpha;
        for hider in &mut self.hiders {
            let lit = self.seeker.illuminates(hider.position);
            hider.alpha = if lit { 1.0 } else { hidden_alpha };
            hider.label_visible = lit;
        }
    }

    fn integrate(&mut self, secs: f32) {
        self.seeker.position += self.seeker.velocity * secs;
        for hider in &mut self.hiders {
            hider.position += hider.velocity * secs;
        }
    }

    /// Seeker contacts resolve before can contacts, so a hider touching
    /// both in the same frame is caught.
    fn resolve_contacts(&mut self, events: &mut Vec<GameEvent>) {
        for i in 0..self.hiders.len() {
            let h = &self.hiders[i];
            if circles_overlap(
                self.seeker.position,
                self.seeker.contact_radius,
                h.position,
                h.contact_radius,
            ) {
                self.capture(i, events);
            }
        }
        for i in 0..self.hiders.len() {
            let h = &self.hiders[i];
            if circles_overlap(
                self.can.position,
                self.can.contact_radius,
                h.position,
                h.contact_radius,
            ) {
                self.try_jailbreak(i, events);
            }
        }
    }

    fn capture(&mut self, index: usize, events: &mut Vec<GameEvent>) {
        let hider = &mut self.hiders[index];
        if !hider.state.is_hiding() || !self.seeker.illuminates(hider.position) {
            return;
        }
        hider.state = HiderState::Jailed;

        let text = format!("Got you {}!", hider.name);
        let at = hider.position - Vec2::new(0.0, self.config.capture_message_offset_y);
        let id = self.hud.push_message(text, at);
        self.timers.schedule(
            Duration::from_secs_f32(self.config.capture_message_secs),
            Scheduled::ExpireMessage(id),
        );

        info!(hider = %hider.id, name = %hider.name, frame = self.frame, "hider captured");
        events.push(GameEvent::Captured {
            hider: hider.id,
            name: hider.name.clone(),
        });
    }

    fn try_jailbreak(&mut self, index: usize, events: &mut Vec<GameEvent>) {
        let hider = &mut self.hiders[index];
        if !hider.state.is_hiding() {
            return;
        }
        hider.state = HiderState::Freeing;
        self.timers.schedule(
            Duration::from_secs_f32(self.config.jailbreak_delay_secs),
            Scheduled::Release,
        );

        debug!(hider = %hider.id, frame = self.frame, "hider reached the can");
        events.push(GameEvent::JailbreakStarted {
            hider: hider.id,
            name: hider.name.clone(),
        });
    }

    fn run_timers(&mut self, dt: Duration, events: &mut Vec<GameEvent>) {
        for action in self.timers.advance(dt) {
            match action {
                Scheduled::ExpireMessage(id) => self.hud.remove_message(id),
                Scheduled::Release => {
                    let released = self
                        .hiders
                        .iter()
                        .filter(|h| !h.state.is_hiding())
                        .count();
                    for hider in &mut self.hiders {
                        hider.state = HiderState::Hiding;
                    }
                    self.hud.show_banner(JAILBREAK_BANNER);
                    info!(released, frame = self.frame, "jailbreak");
                    events.push(GameEvent::Jailbreak { released });
                }
            }
        }
    }

    /// Render-ready view of the current frame.
    pub fn snapshot(&self) -> Snapshot {
        let label_offset = Vec2::new(0.0, self.config.hiders.label_offset_y);
        Snapshot {
            frame: self.frame,
            phase: self.phase,
            seeker: SeekerView {
                position: self.seeker.position,
                velocity: self.seeker.velocity,
            },
            light: self.light,
            hiders: self
                .hiders
                .iter()
                .map(|h| HiderView {
                    id: h.id,
                    name: h.name.clone(),
                    position: h.position,
                    heading: h.heading,
                    state: h.state,
                    alpha: h.alpha,
                    label_position: h.position - label_offset,
                    label_visible: h.label_visible,
                })
                .collect(),
            can: self.can,
            jail: self.jail.zone,
            hud: self.hud.clone(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Frames simulated so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn seeker(&self) -> &Seeker {
        &self.seeker
    }

    /// Direct access for scripted scenarios (tutorials, tests).
    pub fn seeker_mut(&mut self) -> &mut Seeker {
        &mut self.seeker
    }

    pub fn hiders(&self) -> &[Hider] {
        &self.hiders
    }

    pub fn hider(&self, id: HiderId) -> Option<&Hider> {
        self.hiders.iter().find(|h| h.id == id)
    }

    /// Direct access for scripted scenarios (tutorials, tests).
    pub fn hider_mut(&mut self, id: HiderId) -> Option<&mut Hider> {
        self.hiders.iter_mut().find(|h| h.id == id)
    }

    pub fn can(&self) -> &Can {
        &self.can
    }

    pub fn jail(&self) -> &Jail {
        &self.jail
    }

    pub fn light(&self) -> &Light {
        &self.light
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    /// Number of hiders currently in the jail.
    pub fn jailed_count(&self) -> usize {
        self.hiders
            .iter()
            .filter(|h| h.state == HiderState::Jailed)
            .count()
    }
}

/// Uniform integer point inside `rect` (edges included).
fn random_point(rng: &mut StdRng, rect: &Rect) -> Vec2 {
    let (min, max) = (rect.min(), rect.max());
    Vec2::new(
        random_between(rng, min.x, max.x),
        random_between(rng, min.y, max.y),
    )
}

fn random_between(rng: &mut StdRng, lo: f32, hi: f32) -> f32 {
    let (lo, hi) = (lo.ceil() as i32, hi.floor() as i32);
    if lo >= hi {
        return lo as f32;
    }
    rng.random_range(lo..=hi) as f32
}
