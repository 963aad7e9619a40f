pub mod shared {
    pub mod core {
        pub mod periods;
        pub mod primitives;
    }
    pub mod infrastructure {
        pub mod cache_store;
    }
}

pub mod modules {
    pub mod utilization {
        pub mod core {
            pub mod fetch_state;
            pub mod ingest;
            pub mod metrics;
            pub mod name_resolver;
            pub mod pool_filter;
            pub mod pools;
            pub mod ports;
            pub mod records;
            pub mod rollup;
            pub mod snapshot;
        }
        pub mod use_cases {
            pub mod get_snapshot {
                pub mod handler;
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod refresh_snapshot {
                pub mod handler;
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod company_rollup {
                pub mod handler;
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod filter_pool {
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod list_periods {
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod cache_status {
                pub mod inbound {
                    pub mod http;
                }
            }
        }
        pub mod adapters {
            pub mod outbound {
                pub mod data_provider_in_memory;
            }
        }
    }
}

pub mod shell;

#[cfg(test)]
pub mod tests {
    pub mod fixtures;
}
