// Application layer: concrete migration pipelines.

pub mod pipelines;
