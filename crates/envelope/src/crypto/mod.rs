//! AES-256-CBC payload encryption primitives.
//!
//! This module is intentionally free of KMS and HTTP dependencies.
//! It only ever sees already-unwrapped 32-byte keys.
//!
//! # Envelope blob format
//!
//! ```text
//! IV (16 bytes) || AES-256-CBC(PKCS7(plaintext))
//! ```

pub mod cipher;

pub use cipher::{sym_decrypt, sym_encrypt, CipherError, IV_LEN, KEY_LEN};
