pub mod tiny_lfu;
