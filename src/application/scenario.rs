use crate::application::dispatcher::Dispatcher;
use crate::builder::TransactionBuilder;
use crate::builder::linking::follow_on;
use crate::domain::operation::{PaymentMethodRef, TransactionType};
use crate::domain::ports::SequenceGenerator;
use crate::domain::reference::TransactionReference;
use crate::domain::simulation::HostErrorSimulation;
use crate::error::{PaymentError, Result};
use crate::interfaces::csv::outcome_writer::StepOutcome;
use crate::interfaces::csv::scenario_reader::ScenarioStep;
use std::collections::HashMap;
use tracing::debug;

/// Runs scenario steps in order, remembering each result so later steps can
/// follow on from it.
pub struct ScenarioRunner {
    dispatcher: Dispatcher,
    generator: Box<dyn SequenceGenerator>,
    simulation: Option<HostErrorSimulation>,
    results: HashMap<String, TransactionReference>,
}

impl ScenarioRunner {
    pub fn new(dispatcher: Dispatcher, generator: Box<dyn SequenceGenerator>) -> Self {
        Self {
            dispatcher,
            generator,
            simulation: None,
            results: HashMap::new(),
        }
    }

    /// Attaches `simulation` to every step.
    pub fn with_simulation(mut self, simulation: HostErrorSimulation) -> Self {
        self.simulation = Some(simulation);
        self
    }

    pub fn result(&self, step: &str) -> Option<&TransactionReference> {
        self.results.get(step)
    }

    /// Builds, executes and records one step.
    pub async fn run_step(&mut self, step: &ScenarioStep) -> Result<StepOutcome> {
        let spec = self.builder_for(step)?.finalize()?;
        let (reference, envelope) = self.dispatcher.execute_envelope(&spec).await?;

        let header = envelope.request_header();
        let outcome = StepOutcome {
            step: step.step.clone(),
            op: step.op.to_string(),
            outcome: reference
                .status()
                .map_or("APPROVED", |status| status.as_str())
                .to_string(),
            transaction_id: Some(reference.transaction_id().to_string()),
            stan: header.map(|h| h.system_trace_audit_number),
            batch: header.and_then(|h| h.batch_number),
            envelope: Some(envelope.render()),
        };
        self.results.insert(step.step.clone(), reference);
        Ok(outcome)
    }

    fn builder_for(&self, step: &ScenarioStep) -> Result<TransactionBuilder> {
        let mut builder = match (step.op, step.reference.as_deref()) {
            (TransactionType::Capture | TransactionType::Reverse | TransactionType::Refund, Some(reference)) => {
                let origin = self
                    .results
                    .get(reference)
                    .cloned()
                    .unwrap_or_else(|| TransactionReference::from_id(reference));
                debug!(step = %step.step, origin = origin.transaction_id(), "following on");
                let mut builder = follow_on(&origin, step.op)?;
                if let Some(amount) = step.amount {
                    builder.with_amount(amount)?;
                }
                builder
            }
            (TransactionType::Capture | TransactionType::Reverse, None) => {
                return Err(PaymentError::validation(
                    "ref",
                    format!("{} requires an originating step or transaction id", step.op),
                ));
            }
            (TransactionType::Verify, _) => TransactionBuilder::verify(payment_method(step)?)?,
            (kind, _) => {
                let amount = step
                    .amount
                    .ok_or_else(|| PaymentError::validation("amount", "required"))?;
                let method = payment_method(step)?;
                match kind {
                    TransactionType::Authorize => TransactionBuilder::authorize(method, amount)?,
                    TransactionType::Sale => TransactionBuilder::sale(method, amount)?,
                    _ => TransactionBuilder::refund(method, amount)?,
                }
            }
        };

        if let Some(currency) = &step.currency {
            builder.with_currency(currency)?;
        }
        if let Some(key) = &step.idempotency_key {
            builder.with_idempotency_key(key.as_str())?;
        }
        builder.with_tracking_from(self.generator.as_ref())?;
        if let Some(simulation) = &self.simulation {
            builder.with_simulated_host_errors(simulation.clone())?;
        }
        Ok(builder)
    }
}

fn payment_method(step: &ScenarioStep) -> Result<PaymentMethodRef> {
    match step.method.as_deref() {
        Some(handle) if handle.starts_with("PMT_") => Ok(PaymentMethodRef::token(handle)),
        Some(handle) => Ok(PaymentMethodRef::card(handle)),
        None => Err(PaymentError::validation("payment_method", "required")),
    }
}
