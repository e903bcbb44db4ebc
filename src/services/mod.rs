pub mod diagrams;
