// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Injected random byte source.
//!
//! The engine never owns an RNG: callers pass a `CryptoRngCore` into the
//! operations that need fresh CEKs, nonces, or PSS salts. Failures of the
//! source are fatal for the operation.

use cose_abstractions::CoseError;
use rand_core::CryptoRngCore;

/// Draw `len` fresh random bytes from the caller's RNG.
pub fn random_bytes<R: CryptoRngCore>(rng: &mut R, len: usize) -> Result<Vec<u8>, CoseError> {
    let mut buf = vec![0u8; len];
    rng.try_fill_bytes(&mut buf)
        .map_err(|e| CoseError::CryptoBackend(format!("random source failed: {e}")))?;
    Ok(buf)
}
