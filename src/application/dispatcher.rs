use crate::application::interpreter;
use crate::config::NetworkConfig;
use crate::domain::ports::TransportBox;
use crate::domain::reference::TransactionReference;
use crate::domain::spec::TransactionSpec;
use crate::error::Result;
use crate::network::{self, Envelope};
use tracing::{info, warn};

/// Sends finalized specs to the configured host and interprets the replies.
///
/// `Dispatcher` owns the transport and the network configuration. Every
/// local check (matching data, encoding) runs before the host error
/// simulation is consulted, and the simulation runs before the transport, so
/// a request that could never have been sent neither consumes a simulated
/// error nor reaches the host.
pub struct Dispatcher {
    transport: TransportBox,
    config: NetworkConfig,
}

impl Dispatcher {
    /// Creates a new `Dispatcher`.
    ///
    /// # Arguments
    ///
    /// * `transport` - Delivers envelopes to the host.
    /// * `config` - Network, host and terminal identity to render with.
    pub fn new(transport: TransportBox, config: NetworkConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Renders `spec` without sending it.
    pub fn assemble(&self, spec: &TransactionSpec) -> Result<Envelope> {
        network::assemble(spec, &self.config)
    }

    /// Renders, sends and interprets one spec.
    pub async fn execute(&self, spec: &TransactionSpec) -> Result<TransactionReference> {
        self.execute_envelope(spec).await.map(|(reference, _)| reference)
    }

    /// Like [`Dispatcher::execute`], also returning the envelope that was sent.
    pub async fn execute_envelope(
        &self,
        spec: &TransactionSpec,
    ) -> Result<(TransactionReference, Envelope)> {
        let envelope = self.assemble(spec)?;
        let host = self.config.host;

        if let Some(simulation) = spec.simulated_host_errors()
            && let Some(error) = simulation.next(host)
        {
            let error = error.into_error(host);
            warn!(%host, kind = %spec.kind(), %error, "simulated host error");
            return Err(error);
        }

        let response = self.transport.send(host, &envelope).await?;
        let reference = interpreter::interpret(spec, &envelope, host, response)?;
        info!(
            network = %envelope.network(),
            kind = %spec.kind(),
            transaction_id = reference.transaction_id(),
            "transaction completed"
        );
        Ok((reference, envelope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransactionBuilder;
    use crate::domain::operation::PaymentMethodRef;
    use crate::domain::simulation::{Host, HostError, HostErrorSimulation};
    use crate::error::{PaymentError, TransportFault};
    use crate::infrastructure::in_memory::LoopbackTransport;
    use crate::network::Network;
    use rust_decimal_macros::dec;

    fn sale(simulation: Option<HostErrorSimulation>) -> TransactionSpec {
        let mut builder = TransactionBuilder::sale(PaymentMethodRef::card("c"), dec!(10)).unwrap();
        builder.with_currency("USD").unwrap();
        if let Some(simulation) = simulation {
            builder.with_simulated_host_errors(simulation).unwrap();
        }
        builder.finalize().unwrap()
    }

    #[tokio::test]
    async fn test_execute_through_loopback() {
        let transport = LoopbackTransport::new();
        let dispatcher = Dispatcher::new(Box::new(transport.clone()), NetworkConfig::default());

        let reference = dispatcher.execute(&sale(None)).await.unwrap();
        assert!(reference.transaction_id().starts_with("TRN_"));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_simulated_error_replaces_transport_call() {
        let transport = LoopbackTransport::new();
        let dispatcher = Dispatcher::new(Box::new(transport.clone()), NetworkConfig::default());
        let simulation = HostErrorSimulation::new().with_errors(Host::Primary, [HostError::Timeout]);
        let spec = sale(Some(simulation.clone()));

        let first = dispatcher.execute(&spec).await;
        assert!(matches!(
            first,
            Err(PaymentError::TransportFailure {
                fault: TransportFault::Timeout,
                ..
            })
        ));
        assert_eq!(transport.calls(), 0);

        dispatcher.execute(&spec).await.unwrap();
        assert_eq!(transport.calls(), 1);
        assert_eq!(simulation.remaining(Host::Primary), 0);
    }

    #[tokio::test]
    async fn test_errors_for_other_host_are_ignored() {
        let transport = LoopbackTransport::new();
        let dispatcher = Dispatcher::new(Box::new(transport.clone()), NetworkConfig::new(Network::GpApi));
        let simulation =
            HostErrorSimulation::new().with_errors(Host::Secondary, [HostError::decline()]);

        dispatcher.execute(&sale(Some(simulation.clone()))).await.unwrap();
        assert_eq!(transport.calls(), 1);
        assert_eq!(simulation.remaining(Host::Secondary), 1);
    }
}
