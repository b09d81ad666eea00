// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Content fingerprinting for `FileRegistry.fingerprint` (spec.md §3: "a
//! stable id... content fingerprint (cryptographic digest, unique)").
//! SHA-256 over the raw file bytes, streamed so multi-hundred-MB exports
//! don't need to sit fully in memory twice.

use ledger_domain::PipelineError;
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

const READ_BUF_SIZE: usize = 64 * 1024;

pub async fn fingerprint_file(path: &std::path::Path) -> Result<String, PipelineError> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| PipelineError::io_error(format!("opening {}: {e}", path.display())))?;

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| PipelineError::io_error(format!("reading {}: {e}", path.display())))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fingerprint_is_stable_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.csv");
        tokio::fs::write(&path, b"hs6,qty\n010121,500\n").await.unwrap();

        let a = fingerprint_file(&path).await.unwrap();
        let b = fingerprint_file(&path).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn fingerprint_differs_for_different_content() {
        let dir = tempfile::tempdir().unwrap();
        let path_a = dir.path().join("a.csv");
        let path_b = dir.path().join("b.csv");
        tokio::fs::write(&path_a, b"hs6,qty\n010121,500\n").await.unwrap();
        tokio::fs::write(&path_b, b"hs6,qty\n010121,600\n").await.unwrap();

        let fp_a = fingerprint_file(&path_a).await.unwrap();
        let fp_b = fingerprint_file(&path_b).await.unwrap();
        assert_ne!(fp_a, fp_b);
    }
}
