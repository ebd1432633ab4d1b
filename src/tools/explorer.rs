//! Tools backed by the explorer's `?module=..&action=..` API.

use super::params::{object_schema, query_fields, Param, ParamType};
use super::{Tool, ToolContext};
use crate::error::{Error, Result};
use crate::units::{format_units, ETHER_DECIMALS};
use serde_json::{json, Value};

/// How an explorer response is turned into the tool's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Passthrough,
    /// `result` is a wei string; output is the ether amount as a JSON string.
    NativeBalance,
    /// `result` is a token array; each entry becomes `{name, formattedBalance, image}`.
    TokenList,
}

pub struct ExplorerTool {
    pub name: &'static str,
    pub description: &'static str,
    pub module: &'static str,
    pub action: &'static str,
    pub params: &'static [Param],
    pub shape: ResponseShape,
}

#[async_trait::async_trait]
impl Tool for ExplorerTool {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn schema(&self) -> Value {
        object_schema(self.params)
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<Value> {
        let fields = query_fields(self.name, self.params, &args)?;
        let data = ctx.explorer.query(self.module, self.action, &fields).await?;

        match self.shape {
            ResponseShape::Passthrough => Ok(data),
            ResponseShape::NativeBalance => native_balance(&data),
            ResponseShape::TokenList => token_list(data, &ctx.token_icon_base_url),
        }
    }
}

pub fn native_balance(data: &Value) -> Result<Value> {
    let raw = data["result"].as_str().ok_or_else(|| {
        let message = data["message"].as_str().unwrap_or("missing balance");
        Error::malformed("explorer", format!("no balance in response: {}", message))
    })?;
    Ok(Value::String(format_units(raw, ETHER_DECIMALS)?))
}

/// Replaces only `result`; the rest of the envelope is preserved.
pub fn token_list(mut data: Value, icon_base_url: &str) -> Result<Value> {
    let Some(tokens) = data.get("result").and_then(|r| r.as_array()) else {
        return Ok(data);
    };

    let formatted = tokens
        .iter()
        .map(|token| {
            let decimals = token_decimals(&token["decimals"]);
            let balance = token["balance"].as_str().unwrap_or("0");
            let contract = token["contractAddress"].as_str().unwrap_or_default();
            Ok(json!({
                "name": token["name"],
                "formattedBalance": format_units(balance, decimals)?,
                "image": format!("{}/{}.png", icon_base_url, contract),
            }))
        })
        .collect::<Result<Vec<_>>>()?;

    data["result"] = Value::Array(formatted);
    Ok(data)
}

fn token_decimals(value: &Value) -> u8 {
    let parsed = match value {
        Value::String(s) => s.trim().parse::<u8>().ok(),
        Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        _ => None,
    };
    parsed.unwrap_or(ETHER_DECIMALS)
}

const SORT_CHOICES: &[&str] = &["asc", "desc"];
const SORT_DESCRIPTION: &str = "Sort order: 'asc' for ascending, 'desc' for descending";

const fn sort() -> Param {
    Param::optional("sort", ParamType::String, SORT_DESCRIPTION).one_of(SORT_CHOICES)
}

const fn startblock() -> Param {
    Param::optional("startblock", ParamType::Number, "Starting block number to search from")
}

const fn endblock() -> Param {
    Param::optional("endblock", ParamType::Number, "Ending block number to search to")
}

const fn page() -> Param {
    Param::optional("page", ParamType::Number, "Page number for pagination")
}

const fn offset(description: &'static str) -> Param {
    Param::optional("offset", ParamType::Number, description)
}

const BALANCE_PARAMS: &[Param] = &[Param::required(
    "address",
    ParamType::String,
    "The Ethereum address to get balance for",
)];

const TXLIST_PARAMS: &[Param] = &[
    Param::required("address", ParamType::String, "The Ethereum address to get transactions for"),
    sort(),
    startblock(),
    endblock(),
    page(),
    offset("Number of transactions per page"),
];

const ERC20_PARAMS: &[Param] = &[
    Param::optional("address", ParamType::String, "Address to get ERC-20 token transfers for"),
    Param::optional("contractaddress", ParamType::String, "Token contract address to filter by"),
    sort(),
    startblock(),
    endblock(),
    page(),
    offset("Number of transactions per page"),
];

const ERC721_PARAMS: &[Param] = &[
    Param::optional("address", ParamType::String, "Address to get ERC-721 transfers for"),
    Param::optional("contractaddress", ParamType::String, "Token contract address to filter by"),
    sort(),
    startblock(),
    endblock(),
    page(),
    offset("Number of transactions per page"),
];

const ERC1155_PARAMS: &[Param] = &[
    Param::optional("address", ParamType::String, "Address to get ERC-1155 transfers for"),
    Param::optional("contractaddress", ParamType::String, "Token contract address to filter by"),
    sort(),
    startblock(),
    endblock(),
    page(),
    offset("Number of transactions per page"),
];

const TOKENLIST_PARAMS: &[Param] = &[Param::required(
    "address",
    ParamType::String,
    "Address to get token list for",
)];

const INTERNAL_TX_PARAMS: &[Param] = &[
    Param::optional("txhash", ParamType::String, "Transaction hash to check for internal transactions"),
    Param::optional("address", ParamType::String, "Address to get internal transactions for"),
    sort(),
    startblock(),
    endblock(),
    page(),
    offset("Number of transactions per page"),
];

const ABI_PARAMS: &[Param] = &[Param::required(
    "address",
    ParamType::String,
    "The contract address to get the ABI for",
)];

const SOURCE_PARAMS: &[Param] = &[Param::required(
    "address",
    ParamType::String,
    "The contract address to get the source code for",
)];

const CREATION_PARAMS: &[Param] = &[Param::required(
    "contractaddresses",
    ParamType::String,
    "Comma-separated list of contract addresses (max 10)",
)];

const TOKEN_INFO_PARAMS: &[Param] = &[Param::required(
    "contractaddress",
    ParamType::String,
    "The token contract address to get info for",
)];

const HOLDERS_PARAMS: &[Param] = &[
    Param::required("contractaddress", ParamType::String, "The token contract address to get holders for"),
    page(),
    offset("Number of holders per page"),
];

const BRIDGED_PARAMS: &[Param] = &[
    Param::optional("chainid", ParamType::Number, "Chain ID where the original token exists"),
    page(),
    offset("Number of tokens per page"),
];

const TX_INFO_PARAMS: &[Param] = &[
    Param::required("txhash", ParamType::String, "The transaction hash to get info for"),
    Param::optional("index", ParamType::Number, "Log index for pagination"),
];

const TX_RECEIPT_PARAMS: &[Param] = &[Param::required(
    "txhash",
    ParamType::String,
    "The transaction hash to check status for",
)];

const TX_ERROR_PARAMS: &[Param] = &[Param::required(
    "txhash",
    ParamType::String,
    "The transaction hash to check for errors",
)];

pub fn catalogue() -> Vec<ExplorerTool> {
    use ResponseShape::*;

    vec![
        ExplorerTool {
            name: "get_native_token_balance",
            description: "Get the native token balance for an Ethereum address, in whole native units.",
            module: "account",
            action: "balance",
            params: BALANCE_PARAMS,
            shape: NativeBalance,
        },
        ExplorerTool {
            name: "get_transactions_by_address",
            description: "Get transactions by Ethereum address. Maximum of 10,000 transactions. For faster results, specify a smaller block range.",
            module: "account",
            action: "txlist",
            params: TXLIST_PARAMS,
            shape: Passthrough,
        },
        ExplorerTool {
            name: "get_erc20_token_transfers",
            description: "Get ERC-20 token transfer events by address (up to 10,000).",
            module: "account",
            action: "tokentx",
            params: ERC20_PARAMS,
            shape: Passthrough,
        },
        ExplorerTool {
            name: "get_token_list",
            description: "Get list of all tokens and their balances owned by an Ethereum address.",
            module: "account",
            action: "tokenlist",
            params: TOKENLIST_PARAMS,
            shape: TokenList,
        },
        ExplorerTool {
            name: "get_erc721_token_transfers",
            description: "Get ERC-721 (NFT) token transfer events by address or contract.",
            module: "account",
            action: "tokennfttx",
            params: ERC721_PARAMS,
            shape: Passthrough,
        },
        ExplorerTool {
            name: "get_erc1155_token_transfers",
            description: "Get ERC-1155 token transfer events by address or contract.",
            module: "account",
            action: "token1155tx",
            params: ERC1155_PARAMS,
            shape: Passthrough,
        },
        ExplorerTool {
            name: "get_internal_transactions",
            description: "Get internal transactions by transaction hash or address (up to 10,000).",
            module: "account",
            action: "txlistinternal",
            params: INTERNAL_TX_PARAMS,
            shape: Passthrough,
        },
        ExplorerTool {
            name: "get_contract_abi",
            description: "Get the ABI for a verified smart contract address.",
            module: "contract",
            action: "getabi",
            params: ABI_PARAMS,
            shape: Passthrough,
        },
        ExplorerTool {
            name: "get_contract_source_code",
            description: "Get the source code for a verified smart contract address.",
            module: "contract",
            action: "getsourcecode",
            params: SOURCE_PARAMS,
            shape: Passthrough,
        },
        ExplorerTool {
            name: "get_contract_creation",
            description: "Get the creator address and transaction hash for one or more contract addresses (up to 10).",
            module: "contract",
            action: "getcontractcreation",
            params: CREATION_PARAMS,
            shape: Passthrough,
        },
        ExplorerTool {
            name: "get_token_info",
            description: "Get name, symbol, supply, decimals, and type (ERC-20/ERC-721) for a token contract address.",
            module: "token",
            action: "getToken",
            params: TOKEN_INFO_PARAMS,
            shape: Passthrough,
        },
        ExplorerTool {
            name: "get_token_holders",
            description: "Get list of token holders and their balances for a specific token contract address.",
            module: "token",
            action: "getTokenHolders",
            params: HOLDERS_PARAMS,
            shape: Passthrough,
        },
        ExplorerTool {
            name: "get_bridged_tokens",
            description: "Get list of bridged tokens (only available on chains with native bridge).",
            module: "token",
            action: "bridgedTokenList",
            params: BRIDGED_PARAMS,
            shape: Passthrough,
        },
        ExplorerTool {
            name: "get_transaction_info",
            description: "Get detailed information about a transaction including gas, value, logs, revert reason, and more.",
            module: "transaction",
            action: "gettxinfo",
            params: TX_INFO_PARAMS,
            shape: Passthrough,
        },
        ExplorerTool {
            name: "get_transaction_receipt_status",
            description: "Get transaction receipt status (0 = failed, 1 = successful).",
            module: "transaction",
            action: "gettxreceiptstatus",
            params: TX_RECEIPT_PARAMS,
            shape: Passthrough,
        },
        ExplorerTool {
            name: "get_transaction_error_status",
            description: "Get error status and description for a transaction.",
            module: "transaction",
            action: "getstatus",
            params: TX_ERROR_PARAMS,
            shape: Passthrough,
        },
    ]
}
