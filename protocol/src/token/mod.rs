//! Token types, payload layouts and the wire codec.

pub mod codec;
pub mod payloads;
pub mod types;
pub mod wire;

pub use codec::{
    extend, pack, pack_signed_token, pack_token, peek_type, sign_and_pack, size_of,
    split_extended, unpack, unpack_signed_token, unpack_token, unsigned_size, verify_and_unpack,
    EXTENSION_SIZE,
};
pub use payloads::{NanPublic, TokenPayload, WalletPublic};
pub use types::{TokenSpec, TokenType, TransportCommand, TOKEN_SPECS, TOKEN_TYPE_COUNT};
pub use wire::{WireField, WireReader, WireWriter};
