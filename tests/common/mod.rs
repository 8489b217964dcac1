#![allow(dead_code)]

use rust_decimal::Decimal;
use std::fs::File;
use std::io::Error;
use std::path::Path;
use txcompose::application::dispatcher::Dispatcher;
use txcompose::builder::TransactionBuilder;
use txcompose::config::NetworkConfig;
use txcompose::domain::operation::PaymentMethodRef;
use txcompose::infrastructure::in_memory::LoopbackTransport;
use txcompose::network::Network;

pub fn config(network: Network) -> NetworkConfig {
    NetworkConfig {
        company_id: Some("45".to_string()),
        unit_number: Some("12345".to_string()),
        terminal_id: Some("7".to_string()),
        ..NetworkConfig::new(network)
    }
}

/// A dispatcher over a loopback host, plus a handle to inspect the host.
pub fn dispatcher(network: Network) -> (Dispatcher, LoopbackTransport) {
    let transport = LoopbackTransport::new();
    let dispatcher = Dispatcher::new(Box::new(transport.clone()), config(network));
    (dispatcher, transport)
}

/// An authorization with explicit tracking numbers.
pub fn authorize(amount: Decimal, stan: u32) -> TransactionBuilder {
    let mut builder = TransactionBuilder::authorize(PaymentMethodRef::card("card-1"), amount).unwrap();
    builder
        .with_currency("USD")
        .unwrap()
        .with_system_trace_audit_number(stan)
        .unwrap()
        .with_batch_number(12)
        .unwrap()
        .with_sequence_number(3)
        .unwrap();
    builder
}

pub fn generate_scenario_csv(path: &Path, authorizations: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["step", "op", "ref", "amount", "currency", "method", "idempotency_key"])?;
    for i in 1..=authorizations {
        let auth = format!("a{i}");
        wtr.write_record([auth.as_str(), "authorize", "", "10.00", "USD", "card-1", ""])?;
        wtr.write_record([format!("c{i}").as_str(), "capture", auth.as_str(), "", "", "", ""])?;
    }

    wtr.flush()?;
    Ok(())
}
