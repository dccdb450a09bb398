//! Cross-stage tests for the answering pipeline.
