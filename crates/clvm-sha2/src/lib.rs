//! A minimal SHA-256 wrapper with two interchangeable backends.
//!
//! The default backend is the pure-rust `sha2` crate. Enabling the
//! `openssl` feature switches to OpenSSL's implementation, which is
//! measurably faster on some platforms. Both produce identical output,
//! the choice is transparent to callers.

#[cfg(not(feature = "openssl"))]
#[derive(Default, Clone)]
pub struct Sha256 {
    ctx: sha2::Sha256,
}

#[cfg(feature = "openssl")]
#[derive(Clone)]
pub struct Sha256 {
    ctx: openssl::sha::Sha256,
}

#[cfg(feature = "openssl")]
impl Default for Sha256 {
    fn default() -> Self {
        Self {
            ctx: openssl::sha::Sha256::new(),
        }
    }
}

#[cfg(not(feature = "openssl"))]
impl Sha256 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, buf: impl AsRef<[u8]>) {
        use sha2::Digest;
        self.ctx.update(buf.as_ref());
    }

    pub fn finalize(self) -> [u8; 32] {
        use sha2::Digest;
        self.ctx.finalize().into()
    }
}

#[cfg(feature = "openssl")]
impl Sha256 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, buf: impl AsRef<[u8]>) {
        self.ctx.update(buf.as_ref());
    }

    pub fn finalize(self) -> [u8; 32] {
        self.ctx.finish()
    }
}
