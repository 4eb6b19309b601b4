// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types and traits shared by every demo.
//
// Rules for this layer:
//   - NO burn framework types
//   - NO file I/O
//   - Only structs, enums and traits
//
// Keeping tensors out of here means the image and digit
// handling can be unit tested without any backend at all.

// Planar image buffer plus grid / crop / paste helpers
pub mod image;

// One raw dataset digit
pub mod digit;

// Abstractions implemented by the data and infra layers
pub mod traits;
