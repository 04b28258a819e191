// src/enrichment/correction.rs
//! Bounded corrective re-prompting.
//!
//! ```text
//! Requesting ──reply──▶ Validating ──ok──▶ Accepted
//!     ▲                     │
//!     └──── Correcting ◀────┘ invalid, corrections left
//!                           └──▶ Failed   invalid, budget spent (or call failed)
//! ```

use tracing::debug;

use super::{ChatMessage, EnrichmentService};

#[derive(Debug, Clone, PartialEq)]
pub enum Phase<T> {
    Requesting,
    Validating(String),
    Correcting(String),
    Accepted(T),
    Failed(String),
}

impl<T> Phase<T> {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Accepted(_) | Phase::Failed(_))
    }
}

/// Transition table. Drive with the `on_*` methods; anything else is a no-op.
#[derive(Debug, Clone)]
pub struct CorrectionLoop<T> {
    phase: Phase<T>,
    corrections: usize,
    max_corrections: usize,
}

impl<T> CorrectionLoop<T> {
    pub fn new(max_corrections: usize) -> Self {
        Self {
            phase: Phase::Requesting,
            corrections: 0,
            max_corrections,
        }
    }

    pub fn phase(&self) -> &Phase<T> {
        &self.phase
    }

    pub fn corrections(&self) -> usize {
        self.corrections
    }

    pub fn on_reply(&mut self, reply: String) {
        if matches!(self.phase, Phase::Requesting) {
            self.phase = Phase::Validating(reply);
        }
    }

    pub fn on_call_failed(&mut self, reason: String) {
        if matches!(self.phase, Phase::Requesting) {
            self.phase = Phase::Failed(reason);
        }
    }

    pub fn on_validated(&mut self, result: Result<T, String>) {
        if !matches!(self.phase, Phase::Validating(_)) {
            return;
        }
        self.phase = match result {
            Ok(payload) => Phase::Accepted(payload),
            Err(reason) if self.corrections < self.max_corrections => Phase::Correcting(reason),
            Err(reason) => Phase::Failed(reason),
        };
    }

    /// The corrective prompt has been sent; back to waiting for a reply.
    pub fn on_reprompted(&mut self) {
        if matches!(self.phase, Phase::Correcting(_)) {
            self.corrections += 1;
            self.phase = Phase::Requesting;
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match self.phase {
            Phase::Accepted(payload) => Ok(payload),
            Phase::Failed(reason) => Err(reason),
            _ => Err("correction loop did not finish".into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Corrected<T> {
    pub payload: Result<T, String>,
    pub calls: usize,
    pub cost_usd: f64,
}

pub(crate) fn corrective_prompt(reason: &str) -> String {
    format!(
        "Your previous reply was invalid ({reason}). \
         Respond ONLY with valid JSON matching the requested schema and no markdown fences."
    )
}

/// Ask, validate, and re-prompt up to `max_corrections` times.
pub async fn request_validated<T, V>(
    service: &dyn EnrichmentService,
    mut messages: Vec<ChatMessage>,
    validate: V,
    max_corrections: usize,
) -> Corrected<T>
where
    V: Fn(&str) -> Result<T, String>,
{
    let mut machine = CorrectionLoop::new(max_corrections);
    let mut calls = 0usize;
    let mut cost_usd = 0.0;

    while !machine.phase().is_terminal() {
        match machine.phase() {
            Phase::Requesting => {
                calls += 1;
                match service.complete(&messages).await {
                    Ok(reply) => {
                        cost_usd += reply.cost_usd;
                        machine.on_reply(reply.text);
                    }
                    Err(e) => machine.on_call_failed(e.to_string()),
                }
            }
            Phase::Validating(reply) => {
                let reply = reply.clone();
                let verdict = validate(&reply);
                if let Err(reason) = &verdict {
                    debug!(target: "curator::enrichment", reason = %reason, "reply rejected");
                }
                messages.push(ChatMessage::assistant(reply));
                machine.on_validated(verdict);
            }
            Phase::Correcting(reason) => {
                messages.push(ChatMessage::user(corrective_prompt(reason)));
                machine.on_reprompted();
            }
            Phase::Accepted(_) | Phase::Failed(_) => break,
        }
    }

    Corrected {
        payload: machine.into_result(),
        calls,
        cost_usd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::test_support::ScriptedService;
    use crate::error::EnrichmentError;

    fn parse_even(reply: &str) -> Result<u32, String> {
        let n: u32 = reply.trim().parse().map_err(|_| "not a number".to_string())?;
        if n % 2 == 0 {
            Ok(n)
        } else {
            Err(format!("{n} is odd"))
        }
    }

    #[test]
    fn transitions() {
        let mut m: CorrectionLoop<u32> = CorrectionLoop::new(1);
        assert_eq!(m.phase(), &Phase::Requesting);
        m.on_reply("3".into());
        assert_eq!(m.phase(), &Phase::Validating("3".into()));
        m.on_validated(Err("odd".into()));
        assert_eq!(m.phase(), &Phase::Correcting("odd".into()));
        m.on_reprompted();
        assert_eq!(m.corrections(), 1);
        m.on_reply("5".into());
        m.on_validated(Err("still odd".into()));
        assert_eq!(m.phase(), &Phase::Failed("still odd".into()));
        assert!(m.phase().is_terminal());
    }

    #[test]
    fn out_of_order_events_are_ignored() {
        let mut m: CorrectionLoop<u32> = CorrectionLoop::new(2);
        m.on_validated(Ok(1));
        m.on_reprompted();
        assert_eq!(m.phase(), &Phase::Requesting);
        m.on_reply("2".into());
        m.on_reply("4".into());
        assert_eq!(m.phase(), &Phase::Validating("2".into()));
    }

    #[tokio::test]
    async fn accepted_after_one_correction() {
        let svc = ScriptedService::new([Ok("3".to_string()), Ok("4".to_string())]);
        let out = request_validated(&svc, vec![ChatMessage::user("even?")], parse_even, 2).await;
        assert_eq!(out.payload, Ok(4));
        assert_eq!(out.calls, 2);
        let sent = svc.requests.lock().unwrap();
        let second = &sent[1];
        assert_eq!(second.len(), 3);
        assert!(second[2].content.contains("3 is odd"));
    }

    #[tokio::test]
    async fn fails_when_budget_is_spent() {
        let svc = ScriptedService::new(["1", "3", "5", "8"].map(|s| Ok(s.to_string())));
        let out = request_validated(&svc, vec![ChatMessage::user("even?")], parse_even, 2).await;
        assert_eq!(out.payload, Err("5 is odd".to_string()));
        // first request plus two corrections
        assert_eq!(svc.calls(), 3);
        assert!((out.cost_usd - 0.003).abs() < 1e-12);
    }

    #[tokio::test]
    async fn call_failure_ends_the_loop() {
        let svc = ScriptedService::new([Err(EnrichmentError::Timeout(100))]);
        let out = request_validated(&svc, vec![ChatMessage::user("even?")], parse_even, 2).await;
        assert!(out.payload.unwrap_err().contains("timed out"));
        assert_eq!(out.calls, 1);
    }
}
