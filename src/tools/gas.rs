use super::params::{object_schema, required_str, Param, ParamType};
use super::{Tool, ToolContext};
use crate::error::{Error, Result};
use crate::ethereum::rpc_error;
use crate::units::{format_ether, format_gwei};
use alloy::{
    primitives::{Address, U256},
    providers::Provider,
    rpc::types::eth::TransactionRequest,
};
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::debug;

pub struct GetGasPriceTool;

#[async_trait::async_trait]
impl Tool for GetGasPriceTool {
    fn name(&self) -> &'static str {
        "get_gas_price"
    }

    fn description(&self) -> &'static str {
        "Get current gas price in Gwei for the network."
    }

    fn schema(&self) -> Value {
        object_schema(&[])
    }

    async fn call(&self, ctx: &ToolContext, _args: Value) -> Result<Value> {
        let gas_price = ctx.chain.provider.get_gas_price().await.map_err(rpc_error)?;

        // Nodes without EIP-1559 support cannot estimate these.
        let fees = match ctx.chain.provider.estimate_eip1559_fees(None).await {
            Ok(fees) => Some(fees),
            Err(e) => {
                debug!("EIP-1559 fee estimation unavailable: {}", e);
                None
            }
        };

        Ok(json!({
            "gasPrice": gwei_label(U256::from(gas_price)),
            "maxFeePerGas": fees.as_ref().map(|f| gwei_label(U256::from(f.max_fee_per_gas))),
            "maxPriorityFeePerGas": fees.as_ref().map(|f| gwei_label(U256::from(f.max_priority_fee_per_gas))),
        }))
    }
}

fn gwei_label(wei: U256) -> String {
    format!("{} Gwei", format_gwei(wei))
}

pub struct EstimateGasTool;

const ESTIMATE_PARAMS: &[Param] = &[
    Param::required("to", ParamType::String, "The recipient address"),
    Param::optional("data", ParamType::String, "Transaction data (optional, for contract calls)"),
];

#[async_trait::async_trait]
impl Tool for EstimateGasTool {
    fn name(&self) -> &'static str {
        "estimate_transaction_gas"
    }

    fn description(&self) -> &'static str {
        "Estimate gas cost for a transaction without executing it."
    }

    fn schema(&self) -> Value {
        object_schema(ESTIMATE_PARAMS)
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<Value> {
        let to_str = required_str(self.name(), &args, "to")?;
        let to = Address::from_str(to_str)
            .map_err(|e| Error::invalid_arguments(self.name(), format!("to: {}", e)))?;

        let mut tx = TransactionRequest::default().to(to);
        if let Some(from) = ctx.chain.signer_address() {
            tx = tx.from(from);
        }
        if let Some(data) = args.get("data").and_then(|v| v.as_str()) {
            let bytes = hex::decode(data.trim_start_matches("0x"))
                .map_err(|e| Error::invalid_arguments(self.name(), format!("data: {}", e)))?;
            tx = tx.input(bytes.into());
        }

        let gas = ctx.chain.provider.estimate_gas(&tx).await.map_err(rpc_error)?;
        let gas_price = ctx.chain.provider.get_gas_price().await.map_err(rpc_error)?;
        let cost = U256::from(gas) * U256::from(gas_price);

        Ok(json!({
            "estimatedGas": gas.to_string(),
            "estimatedCost": format_ether(cost),
            "to": to_str,
        }))
    }
}
