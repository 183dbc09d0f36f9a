//! A backend sending real transactions through an alloy provider

use std::path::PathBuf;

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt, Specifier},
    json_abi::JsonAbi,
    network::TransactionBuilder,
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use alloy_primitives::{Address, Bytes, B256, U256};
use serde::Deserialize;
use tracing::debug;

use super::{DeployReceipt, DeployRequest, DeploymentBackend};
use crate::{
    constants::ARTIFACT_EXTENSION, errors::ScriptError, solidity::IRegistry, types::ArgValue,
};

/// A compiled contract, as emitted by Hardhat or Foundry
#[derive(Debug, Deserialize)]
struct ContractArtifact {
    /// The contract ABI
    abi: JsonAbi,
    /// The creation bytecode
    bytecode: ArtifactBytecode,
}

/// Creation bytecode, a bare hex string (Hardhat) or wrapped in an object (Foundry)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ArtifactBytecode {
    /// `"bytecode": "0x..."`
    Hex(Bytes),
    /// `"bytecode": { "object": "0x..." }`
    Object {
        /// The bytecode
        object: Bytes,
    },
}

impl ContractArtifact {
    /// The creation bytecode
    fn bytecode(&self) -> &Bytes {
        match &self.bytecode {
            ArtifactBytecode::Hex(code) | ArtifactBytecode::Object { object: code } => code,
        }
    }

    /// The creation bytecode followed by the ABI-encoded constructor arguments
    fn deploy_code(&self, args: &[ArgValue]) -> Result<Bytes, ScriptError> {
        let mut code = self.bytecode().to_vec();
        if code.is_empty() {
            return Err(ScriptError::ArtifactParsing(
                "artifact has no creation bytecode, is it abstract?".to_string(),
            ));
        }

        let Some(constructor) = &self.abi.constructor else {
            if !args.is_empty() {
                return Err(ScriptError::CalldataConstruction(format!(
                    "{} constructor arguments given, the artifact has no constructor",
                    args.len()
                )));
            }
            return Ok(code.into());
        };

        if constructor.inputs.len() != args.len() {
            return Err(ScriptError::CalldataConstruction(format!(
                "constructor takes {} arguments, {} given",
                constructor.inputs.len(),
                args.len()
            )));
        }

        let mut values = Vec::<DynSolValue>::with_capacity(args.len());
        for (arg, param) in args.iter().zip(constructor.inputs.iter()) {
            let value = match arg {
                ArgValue::Address(address) => DynSolValue::Address(*address),
                ArgValue::Literal(literal) => param
                    .resolve()
                    .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?
                    .coerce_str(literal)
                    .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?,
            };
            values.push(value);
        }

        let encoded_args = constructor
            .abi_encode_input_raw(&values)
            .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;
        code.extend(encoded_args);

        Ok(code.into())
    }
}

/// A backend deploying through a node, signing with a local private key
#[derive(Clone)]
pub struct RpcBackend {
    /// The provider, with the deployer's wallet attached
    provider: DynProvider,
    /// The directory holding the compiled contract artifacts
    artifacts_dir: PathBuf,
}

impl RpcBackend {
    /// A backend over an existing provider
    pub fn new(provider: DynProvider, artifacts_dir: PathBuf) -> Self {
        Self {
            provider,
            artifacts_dir,
        }
    }

    /// Connect to the node at the given RPC url, signing with the given key
    pub fn connect(
        rpc_url: &str,
        signer: PrivateKeySigner,
        artifacts_dir: PathBuf,
    ) -> Result<Self, ScriptError> {
        let url =
            Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
        let provider = ProviderBuilder::new().wallet(signer).connect_http(url);

        Ok(Self::new(DynProvider::new(provider), artifacts_dir))
    }

    /// The chain id of the connected network
    pub async fn chain_id(&self) -> Result<u64, ScriptError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))
    }

    /// Read a compiled artifact from the artifacts directory
    fn load_artifact(&self, artifact: &str) -> Result<ContractArtifact, ScriptError> {
        let path = self
            .artifacts_dir
            .join(format!("{artifact}.{ARTIFACT_EXTENSION}"));
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", path.display())))?;

        serde_json::from_str(&contents)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", path.display())))
    }

    /// Send a transaction and wait for it to succeed
    async fn send(&self, tx: TransactionRequest) -> Result<TransactionReceipt, ScriptError> {
        let pending_tx = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
        debug!("sent tx: {:#x}", pending_tx.tx_hash());

        let receipt = pending_tx
            .get_receipt()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
        if !receipt.status() {
            return Err(ScriptError::ContractInteraction(format!(
                "transaction {:#x} reverted",
                receipt.transaction_hash
            )));
        }

        Ok(receipt)
    }
}

impl DeploymentBackend for RpcBackend {
    async fn deploy(&self, request: DeployRequest<'_>) -> Result<DeployReceipt, ScriptError> {
        let artifact = self.load_artifact(request.artifact)?;
        let code = artifact.deploy_code(request.args)?;

        let tx = TransactionRequest::default()
            .with_from(request.sender)
            .with_deploy_code(code);
        let receipt = self.send(tx).await?;

        let address = receipt.contract_address.ok_or_else(|| {
            ScriptError::ContractInteraction("no contract address in receipt".to_string())
        })?;

        Ok(DeployReceipt {
            address,
            transaction_hash: receipt.transaction_hash,
        })
    }

    async fn registry_lookup(&self, registry: Address) -> Result<Address, ScriptError> {
        IRegistry::new(registry, &self.provider)
            .lookup()
            .call()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }

    async fn registry_register(
        &self,
        registry: Address,
        pointer: Address,
        sender: Address,
    ) -> Result<B256, ScriptError> {
        let receipt = IRegistry::new(registry, &self.provider)
            .register(pointer)
            .from(sender)
            .send()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
            .get_receipt()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        if !receipt.status() {
            return Err(ScriptError::ContractInteraction(format!(
                "registration {:#x} reverted",
                receipt.transaction_hash
            )));
        }

        Ok(receipt.transaction_hash)
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, ScriptError> {
        self.provider
            .get_code_at(address)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }

    async fn transfer(
        &self,
        to: Address,
        value: U256,
        sender: Address,
    ) -> Result<B256, ScriptError> {
        let tx = TransactionRequest::default()
            .with_from(sender)
            .with_to(to)
            .with_value(value);

        Ok(self.send(tx).await?.transaction_hash)
    }

    async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, ScriptError> {
        let receipt = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
            .get_receipt()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        Ok(receipt.transaction_hash)
    }
}
