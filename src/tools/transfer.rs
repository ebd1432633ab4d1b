use super::params::{object_schema, required_str, Param, ParamType};
use super::{Tool, ToolContext};
use crate::error::{Error, Result};
use crate::ethereum::rpc_error;
use crate::units::{parse_units, ETHER_DECIMALS};
use alloy::{
    primitives::Address,
    providers::Provider,
    rpc::types::eth::TransactionRequest,
    sol,
    sol_types::SolCall,
};
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::info;

sol! {
    #[allow(missing_docs)]
    function transfer(address to, uint256 amount) external returns (bool);
    #[allow(missing_docs)]
    function decimals() external view returns (uint8);
}

fn parse_address(tool: &str, field: &str, value: &str) -> Result<Address> {
    Address::from_str(value)
        .map_err(|e| Error::invalid_arguments(tool, format!("{}: {}", field, e)))
}

pub struct SendNativeTokenTool;

const NATIVE_PARAMS: &[Param] = &[
    Param::required("to", ParamType::String, "The recipient address to send tokens to"),
    Param::required(
        "amount",
        ParamType::String,
        "The amount of tokens to send (in native units, e.g., '0.1' for 0.1 ETH)",
    ),
];

#[async_trait::async_trait]
impl Tool for SendNativeTokenTool {
    fn name(&self) -> &'static str {
        "send_native_token"
    }

    fn description(&self) -> &'static str {
        "Send native blockchain token (ETH on Ethereum, ARB on Arbitrum, etc.) to another address."
    }

    fn schema(&self) -> Value {
        object_schema(NATIVE_PARAMS)
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<Value> {
        let from = ctx.chain.signer()?.address;
        let to_str = required_str(self.name(), &args, "to")?;
        let amount = required_str(self.name(), &args, "amount")?;
        let to = parse_address(self.name(), "to", to_str)?;
        let value = parse_units(amount, ETHER_DECIMALS)?;

        let tx = TransactionRequest::default().to(to).value(value);
        let hash = ctx.chain.broadcast(tx).await?;
        info!("Broadcast native transfer {} to {}", hash, to);

        Ok(json!({
            "success": true,
            "hash": hash.to_string(),
            "from": from.to_string(),
            "to": to_str,
            "amount": amount,
            "message": format!("Transaction sent: {}. Waiting for confirmation...", hash),
        }))
    }
}

pub struct SendErc20TokenTool;

const ERC20_PARAMS: &[Param] = &[
    Param::required("contractAddress", ParamType::String, "The ERC-20 token contract address"),
    Param::required("to", ParamType::String, "The recipient address to send tokens to"),
    Param::required(
        "amount",
        ParamType::String,
        "The amount of tokens to send (in token units, e.g., '100' for 100 USDC)",
    ),
];

#[async_trait::async_trait]
impl Tool for SendErc20TokenTool {
    fn name(&self) -> &'static str {
        "send_erc20_token"
    }

    fn description(&self) -> &'static str {
        "Send ERC-20 tokens to another address. Requires token contract address, recipient, and amount."
    }

    fn schema(&self) -> Value {
        object_schema(ERC20_PARAMS)
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<Value> {
        let from = ctx.chain.signer()?.address;
        let token_str = required_str(self.name(), &args, "contractAddress")?;
        let to_str = required_str(self.name(), &args, "to")?;
        let amount = required_str(self.name(), &args, "amount")?;
        let token = parse_address(self.name(), "contractAddress", token_str)?;
        let to = parse_address(self.name(), "to", to_str)?;

        let decimals_req = TransactionRequest::default()
            .to(token)
            .input(decimalsCall {}.abi_encode().into());
        let decimals_res = ctx.chain.provider.call(&decimals_req).await.map_err(rpc_error)?;
        let decimals: u8 = decimalsCall::abi_decode_returns(&decimals_res, true)
            .map_err(|e| Error::tool_execution(self.name(), format!("decimals(): {}", e)))?
            ._0;

        let raw_amount = parse_units(amount, decimals)?;
        let call_data = transferCall {
            to,
            amount: raw_amount,
        }
        .abi_encode();

        let tx = TransactionRequest::default().to(token).input(call_data.into());
        let hash = ctx.chain.broadcast(tx).await?;
        info!("Broadcast ERC-20 transfer {} of {} to {}", hash, token, to);

        Ok(json!({
            "success": true,
            "hash": hash.to_string(),
            "from": from.to_string(),
            "to": to_str,
            "contractAddress": token_str,
            "amount": amount,
            "message": format!("Token transfer sent: {}. Waiting for confirmation...", hash),
        }))
    }
}
