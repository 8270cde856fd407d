//! In-memory ledger for tests.

use solana_account::Account;
use solana_commitment_config::CommitmentConfig;
use solana_keypair::Keypair;
use solana_message::Hash;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_transaction::versioned::VersionedTransaction;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::chain::rpc::{LedgerClientLike, LedgerError, SignatureStatus};

/// A fresh random address.
pub fn unique_pubkey() -> Pubkey {
    Keypair::new().pubkey()
}

pub struct MockLedger {
    accounts: HashMap<Pubkey, Account>,
    blockhash: Hash,
    reads: Mutex<Vec<Pubkey>>,
    blockhash_reads: Mutex<usize>,
    sent: Mutex<Vec<VersionedTransaction>>,
    send_outcomes: Mutex<VecDeque<Result<(), LedgerError>>>,
    status_outcomes: Mutex<VecDeque<Result<SignatureStatus, LedgerError>>>,
    final_status: SignatureStatus,
    transaction_logs: Vec<String>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self {
            accounts: HashMap::new(),
            blockhash: Hash::new_from_array([7u8; 32]),
            reads: Mutex::new(Vec::new()),
            blockhash_reads: Mutex::new(0),
            sent: Mutex::new(Vec::new()),
            send_outcomes: Mutex::new(VecDeque::new()),
            status_outcomes: Mutex::new(VecDeque::new()),
            final_status: SignatureStatus::Confirmed,
            transaction_logs: Vec::new(),
        }
    }
}

impl MockLedger {
    pub fn with_account(mut self, pubkey: Pubkey, account: Account) -> Self {
        self.accounts.insert(pubkey, account);
        self
    }

    /// Outcomes of successive sends; sends succeed once these run out.
    pub fn with_send_outcomes(self, outcomes: Vec<Result<(), LedgerError>>) -> Self {
        *self.send_outcomes.lock().unwrap() = outcomes.into();
        self
    }

    /// Outcomes of successive status polls; afterwards `final_status` is reported.
    pub fn with_status_outcomes(self, outcomes: Vec<Result<SignatureStatus, LedgerError>>) -> Self {
        *self.status_outcomes.lock().unwrap() = outcomes.into();
        self
    }

    pub fn with_final_status(mut self, status: SignatureStatus) -> Self {
        self.final_status = status;
        self
    }

    /// Logs returned for any landed transaction.
    pub fn with_transaction_logs(mut self, logs: Vec<String>) -> Self {
        self.transaction_logs = logs;
        self
    }

    pub fn blockhash(&self) -> Hash {
        self.blockhash
    }

    pub fn reads(&self) -> Vec<Pubkey> {
        self.reads.lock().unwrap().clone()
    }

    pub fn blockhash_reads(&self) -> usize {
        *self.blockhash_reads.lock().unwrap()
    }

    pub fn sent(&self) -> Vec<VersionedTransaction> {
        self.sent.lock().unwrap().clone()
    }

    /// Total number of ledger calls of any kind.
    pub fn calls(&self) -> usize {
        self.reads().len() + self.blockhash_reads() + self.sent().len()
    }
}

impl LedgerClientLike for MockLedger {
    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, LedgerError> {
        self.reads.lock().unwrap().push(*pubkey);
        Ok(self.accounts.get(pubkey).cloned())
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError> {
        *self.blockhash_reads.lock().unwrap() += 1;
        Ok(self.blockhash)
    }

    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
        _commitment: CommitmentConfig,
    ) -> Result<Signature, LedgerError> {
        self.sent.lock().unwrap().push(transaction.clone());
        let outcome = self.send_outcomes.lock().unwrap().pop_front();
        outcome.unwrap_or(Ok(()))?;
        Ok(transaction.signatures[0])
    }

    async fn get_signature_status(
        &self,
        _signature: &Signature,
        _commitment: CommitmentConfig,
    ) -> Result<SignatureStatus, LedgerError> {
        let outcome = self.status_outcomes.lock().unwrap().pop_front();
        outcome.unwrap_or_else(|| Ok(self.final_status.clone()))
    }

    async fn get_transaction_logs(
        &self,
        _signature: &Signature,
        _commitment: CommitmentConfig,
    ) -> Result<Vec<String>, LedgerError> {
        Ok(self.transaction_logs.clone())
    }
}
