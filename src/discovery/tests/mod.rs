//! Unit tests for the discovery domain and services.
