//! Cross-modal binding: a shared deterministic embedding
//! space, per-modality indices, a bindings table, and context/temporal
//! grounding.

mod binding;
mod embed;
mod ground;
mod index;

pub use binding::{Binding, BindingTable};
pub use embed::{cosine_similarity, CrossModalEmbedder, Modality, EMBEDDING_DIM};
pub use ground::{decay_temporal, ground};
pub use index::{top_k_cosine, ModalityIndex};
