use crate::db::scrapes::ScrapeRun;
use crate::domain::ListingStatus;
use crate::templates::desktop_layout;
use maud::{html, Markup};

pub struct AdminVm {
    pub status_counts: Vec<(ListingStatus, i64)>,
    pub scrapes: Vec<ScrapeRun>,
}

const TH: &str = "padding: 12px 8px; border-bottom: 2px solid #e5e7eb; text-align: left;";
const TD: &str = "padding: 8px; border-bottom: 1px solid #f3f4f6;";

fn count(value: Option<i64>) -> String {
    value.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn admin_page(vm: &AdminVm) -> Markup {
    desktop_layout(
        "Admin Dashboard",
        html! {
            main class="container" {
                h1 { "Admin Dashboard" }

                div class="card" style="margin-bottom: 2rem;" {
                    h3 { "Listings by Status" }
                    p { a href="/admin/listings" { "Browse listings (JSON)" } }
                    table style="width: 100%; border-collapse: collapse;" {
                        tbody {
                            @for (status, n) in &vm.status_counts {
                                tr {
                                    td style=(TD) { (status) }
                                    td style=(TD) { (n) }
                                }
                            }
                        }
                    }
                }

                div class="card" style="margin-bottom: 2rem;" {
                    h3 { "Scraper Control" }
                    form action="/admin/scrape" method="post" style="margin-bottom: 1rem;" {
                        button type="submit" style="padding: 8px 16px; background: #3b82f6; color: white; border: none; border-radius: 4px; cursor: pointer;" { "Run Scrape Now" }
                    }

                    h4 { "Recent Runs" }
                    div style="overflow-x: auto;" {
                        table style="width: 100%; border-collapse: collapse;" {
                            thead {
                                tr {
                                    th style=(TH) { "Started" }
                                    th style=(TH) { "Trigger" }
                                    th style=(TH) { "Scraped" }
                                    th style=(TH) { "Created" }
                                    th style=(TH) { "Updated" }
                                    th style=(TH) { "Unchanged" }
                                    th style=(TH) { "Inactive" }
                                    th style=(TH) { "Errors" }
                                    th style=(TH) { "Result" }
                                }
                            }
                            tbody {
                                @if vm.scrapes.is_empty() {
                                    tr { td colspan="9" style=(TD) { "No runs yet." } }
                                }
                                @for run in &vm.scrapes {
                                    tr {
                                        td style=(TD) { (run.started_at.format("%Y-%m-%d %H:%M:%S")) }
                                        td style=(TD) { (run.trigger) }
                                        td style=(TD) { (count(run.total_scraped)) }
                                        td style=(TD) { (count(run.created)) }
                                        td style=(TD) { (count(run.updated)) }
                                        td style=(TD) { (count(run.unchanged)) }
                                        td style=(TD) { (count(run.marked_inactive)) }
                                        td style=(TD) { (count(run.errors)) }
                                        td style=(TD) {
                                            @if run.success {
                                                span style="color: #059669;" { "ok" }
                                            } @else if run.finished_at.is_none() {
                                                span style="color: #6b7280;" { "running" }
                                            } @else {
                                                span style="color: #dc2626;" {
                                                    "failed: " (run.error_message.as_deref().unwrap_or("unknown"))
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
    )
}
