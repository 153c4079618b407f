pub mod backend; // Generator core and the default C-like pass
pub mod binding; // Resource binding allocation
pub mod error;
pub mod hlsl; // HLSL backend
pub mod prelude; // Filesystem collaborator for prelude overrides
pub mod source; // Line-oriented source builder

pub use backend::{c_like, FunctionStyle, GeneratorOptions, ShaderBackend};
pub use binding::{allocate_bindings, Binding, SparseSequence};
pub use error::{CodegenError, CodegenResult};
pub use hlsl::HlslGenerator;
pub use prelude::{load_prelude, OsPreludeSource, PreludeSource};
pub use source::{SourceBuilder, StringSink};
