//! Outcome policies decide the result of mock settlements.
use std::{collections::VecDeque, sync::Mutex};

use log::*;
use rand::Rng;

use crate::{engine_api::payment_objects::PaymentRequest, payment::PaymentMethod, traits::OutcomePolicy};

pub struct AlwaysApprove;

impl OutcomePolicy for AlwaysApprove {
    fn approve(&self, _method: PaymentMethod, _request: &PaymentRequest) -> bool {
        true
    }
}

pub struct AlwaysDecline;

impl OutcomePolicy for AlwaysDecline {
    fn approve(&self, _method: PaymentMethod, _request: &PaymentRequest) -> bool {
        false
    }
}

/// Approves each payment independently with probability `success_rate`.
pub struct RandomApproval {
    success_rate: f64,
}

impl RandomApproval {
    /// `success_rate` is clamped to `[0, 1]`.
    pub fn new(success_rate: f64) -> Self {
        let success_rate = if success_rate.is_nan() { 0.0 } else { success_rate.clamp(0.0, 1.0) };
        Self { success_rate }
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }
}

impl OutcomePolicy for RandomApproval {
    fn approve(&self, method: PaymentMethod, request: &PaymentRequest) -> bool {
        let approved = rand::thread_rng().gen_bool(self.success_rate);
        trace!("💳️ Mock {method} payment for [{}] approved: {approved}", request.order_id);
        approved
    }
}

/// Plays back a fixed script of results, then falls back to a default. Handy for driving flows step by step.
pub struct ScriptedApproval {
    script: Mutex<VecDeque<bool>>,
    otherwise: bool,
}

impl ScriptedApproval {
    pub fn new<I: IntoIterator<Item = bool>>(script: I, otherwise: bool) -> Self {
        Self { script: Mutex::new(script.into_iter().collect()), otherwise }
    }
}

impl OutcomePolicy for ScriptedApproval {
    fn approve(&self, _method: PaymentMethod, _request: &PaymentRequest) -> bool {
        match self.script.lock() {
            Ok(mut script) => script.pop_front().unwrap_or(self.otherwise),
            Err(e) => {
                error!("💳️ Scripted approval lock is poisoned: {e}");
                self.otherwise
            },
        }
    }
}
