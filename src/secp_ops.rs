use crate::allocator::{Allocator, NodePtr};
use crate::cost::{check_cost, Cost};
use crate::error::EvalErr;
use crate::op_utils::{atom, get_args};
use crate::reduction::{Reduction, Response};
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature as K1Signature, VerifyingKey as K1VerifyingKey};
use p256::ecdsa::{Signature as R1Signature, VerifyingKey as R1VerifyingKey};

const SECP256K1_VERIFY_COST: Cost = 1_300_000;
const SECP256R1_VERIFY_COST: Cost = 1_850_000;

/// (secp256k1_verify pubkey msg_hash signature). The public key is a
/// 33 byte SEC1 compressed point, the message hash 32 bytes and the
/// signature the 64 byte fixed encoding. Returns nil on success.
pub fn op_secp256k1_verify(
    a: &mut Allocator,
    input: NodePtr,
    max_cost: Cost,
    _flags: u32,
) -> Response {
    let cost = SECP256K1_VERIFY_COST;
    check_cost(cost, max_cost)?;

    let [pk_node, msg_node, sig_node] =
        get_args::<3>(a, input, "secp256k1_verify takes exactly 3 arguments")?;

    let pk = atom(a, pk_node, "secp256k1 public key on list")?;
    if pk.as_ref().len() != 33 {
        return Err(EvalErr::ArgSize(pk_node, "secp256k1 pubkey is not 33 bytes"));
    }
    let verifier = K1VerifyingKey::from_sec1_bytes(pk.as_ref())
        .map_err(|_| EvalErr::InvalidCurvePoint(pk_node, "invalid secp256k1 pubkey"))?;

    let msg = atom(a, msg_node, "secp256k1 message on list")?;
    if msg.as_ref().len() != 32 {
        return Err(EvalErr::ArgSize(msg_node, "secp256k1 message hash is not 32 bytes"));
    }

    let sig = atom(a, sig_node, "secp256k1 signature on list")?;
    if sig.as_ref().len() != 64 {
        return Err(EvalErr::ArgSize(sig_node, "secp256k1 signature is not 64 bytes"));
    }
    let sig = K1Signature::from_slice(sig.as_ref())
        .map_err(|_| EvalErr::SignatureVerifyFailed(sig_node, "invalid secp256k1 signature"))?;

    if verifier.verify_prehash(msg.as_ref(), &sig).is_err() {
        return Err(EvalErr::SignatureVerifyFailed(
            input,
            "secp256k1_verify failed",
        ));
    }
    Ok(Reduction(cost, a.nil()))
}

/// (secp256r1_verify pubkey msg_hash signature), same shapes as the
/// secp256k1 form.
pub fn op_secp256r1_verify(
    a: &mut Allocator,
    input: NodePtr,
    max_cost: Cost,
    _flags: u32,
) -> Response {
    let cost = SECP256R1_VERIFY_COST;
    check_cost(cost, max_cost)?;

    let [pk_node, msg_node, sig_node] =
        get_args::<3>(a, input, "secp256r1_verify takes exactly 3 arguments")?;

    let pk = atom(a, pk_node, "secp256r1 public key on list")?;
    if pk.as_ref().len() != 33 {
        return Err(EvalErr::ArgSize(pk_node, "secp256r1 pubkey is not 33 bytes"));
    }
    let verifier = R1VerifyingKey::from_sec1_bytes(pk.as_ref())
        .map_err(|_| EvalErr::InvalidCurvePoint(pk_node, "invalid secp256r1 pubkey"))?;

    let msg = atom(a, msg_node, "secp256r1 message on list")?;
    if msg.as_ref().len() != 32 {
        return Err(EvalErr::ArgSize(msg_node, "secp256r1 message hash is not 32 bytes"));
    }

    let sig = atom(a, sig_node, "secp256r1 signature on list")?;
    if sig.as_ref().len() != 64 {
        return Err(EvalErr::ArgSize(sig_node, "secp256r1 signature is not 64 bytes"));
    }
    let sig = R1Signature::from_slice(sig.as_ref())
        .map_err(|_| EvalErr::SignatureVerifyFailed(sig_node, "invalid secp256r1 signature"))?;

    if verifier.verify_prehash(msg.as_ref(), &sig).is_err() {
        return Err(EvalErr::SignatureVerifyFailed(
            input,
            "secp256r1_verify failed",
        ));
    }
    Ok(Reduction(cost, a.nil()))
}
