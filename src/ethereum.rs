use crate::error::{Error, Result};
use alloy::{
    network::EthereumWallet,
    primitives::{Address, TxHash},
    providers::{Provider, ProviderBuilder},
    rpc::types::eth::TransactionRequest,
    signers::local::PrivateKeySigner,
};
use std::str::FromStr;
use url::Url;

const SERVICE: &str = "rpc";

#[derive(Clone)]
pub struct Signer {
    pub wallet: EthereumWallet,
    pub address: Address,
}

/// Node RPC access. The signer is optional; only transfer tools require it.
#[derive(Clone)]
pub struct EthereumClient {
    pub provider: alloy::providers::RootProvider<
        alloy::transports::http::Http<alloy::transports::http::Client>,
    >,
    rpc_url: Url,
    signer: Option<Signer>,
}

impl EthereumClient {
    pub fn new(rpc_url: &str, private_key: Option<&str>) -> anyhow::Result<Self> {
        let url = Url::parse(rpc_url)?;
        let provider = ProviderBuilder::new().on_http(url.clone());

        let signer = match private_key {
            Some(key) => {
                let signer = PrivateKeySigner::from_str(key.trim())?;
                let address = signer.address();
                Some(Signer {
                    wallet: EthereumWallet::from(signer),
                    address,
                })
            }
            None => None,
        };

        Ok(Self {
            provider,
            rpc_url: url,
            signer,
        })
    }

    pub fn signer_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address)
    }

    pub fn signer(&self) -> Result<&Signer> {
        self.signer.as_ref().ok_or(Error::MissingCredential("PRIVATE_KEY"))
    }

    /// Signs and broadcasts `tx`, returning as soon as the node accepts it.
    pub async fn broadcast(&self, tx: TransactionRequest) -> Result<TxHash> {
        let signer = self.signer()?;
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(signer.wallet.clone())
            .on_http(self.rpc_url.clone());

        let pending = provider
            .send_transaction(tx.from(signer.address))
            .await
            .map_err(rpc_error)?;

        Ok(*pending.tx_hash())
    }
}

pub fn rpc_error(err: impl std::fmt::Display) -> Error {
    Error::upstream(SERVICE, None, err.to_string())
}
