//! Service layer: resolution, precedence, and the request pipeline.

pub mod config_resolver;
pub mod pipeline;
pub mod response_assembler;
pub mod variable_resolver;

pub use config_resolver::{ConfigResolver, Resolution, ResolutionEvent, ResolutionStep};
pub use pipeline::{PipelineOutput, RequestPipeline};
pub use response_assembler::ResponseAssembler;
pub use variable_resolver::VariablePrecedenceResolver;
