use solana_pubkey::Pubkey;
use solana_signature::Signature;
use x402_types::proto::{PaymentProof, ProofPayload, SelectedPayment, X402Version1};

use crate::settlement::error::ProofError;
use crate::settlement::types::SettlementResult;

/// Wraps a settled payment into the proof envelope replayed to the resource server.
///
/// `scheme` and `network` echo the selected option, so the server sees the tags it offered.
pub fn encode_proof(
    result: &SettlementResult,
    payer: &Pubkey,
    selected: &SelectedPayment,
) -> Result<PaymentProof, ProofError> {
    match result {
        SettlementResult::Settled { signature, .. } => Ok(proof_for(signature, payer, selected)),
        SettlementResult::Failed { error } => Err(ProofError::NotSettled(error.to_string())),
    }
}

/// Proof for a signature already known to be confirmed.
pub fn proof_for(signature: &Signature, payer: &Pubkey, selected: &SelectedPayment) -> PaymentProof {
    PaymentProof {
        x402_version: X402Version1,
        scheme: selected.option.scheme.clone(),
        network: selected.option.network.clone(),
        payload: ProofPayload {
            signature: signature.to_string(),
            from: payer.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::error::SettlementError;
    use crate::settlement::mock::unique_pubkey;
    use x402_types::proto::PaymentOption;
    use x402_types::util::money_amount::MoneyAmount;

    fn selected() -> SelectedPayment {
        SelectedPayment {
            option: PaymentOption {
                id: "sol".to_string(),
                scheme: "exact".to_string(),
                network: "solana-devnet".to_string(),
                recipient: unique_pubkey().to_string(),
                token: None,
                amount: "0.01".to_string(),
                decimals: 9,
            },
            network: "devnet".to_string(),
        }
    }

    #[test]
    fn test_proof_carries_signature_payer_and_option_tags() {
        let payer = unique_pubkey();
        let signature = Signature::from([5u8; 64]);
        let result = SettlementResult::Settled {
            signature,
            amount: MoneyAmount::parse("0.01").unwrap(),
            base_units: 10_000_000,
            recipient: unique_pubkey(),
        };
        let proof = encode_proof(&result, &payer, &selected()).unwrap();
        assert_eq!(proof.scheme, "exact");
        assert_eq!(proof.network, "solana-devnet");
        assert_eq!(proof.payload.signature, signature.to_string());
        assert_eq!(proof.payload.from, payer.to_string());

        let decoded = PaymentProof::from_header(&proof.to_header().unwrap()).unwrap();
        assert_eq!(decoded, proof);
    }

    #[test]
    fn test_failed_result_has_no_proof() {
        let result = SettlementResult::Failed {
            error: SettlementError::ConfirmationTimeout {
                signature: "abc".to_string(),
            },
        };
        let err = encode_proof(&result, &unique_pubkey(), &selected()).unwrap_err();
        assert!(matches!(err, ProofError::NotSettled(_)));
    }
}
