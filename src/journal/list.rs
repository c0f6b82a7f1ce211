//! The journal listing page.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, endpoints,
    auth::RequestContext,
    html::{
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base, format_cents,
    },
    journal::{
        db::{count_journal_entries, get_journal_entries},
        domain::{JournalEntryDetail, LineKind},
    },
    navigation::NavBar,
    pagination::{PaginationConfig, PaginationIndicator, create_pagination_indicators},
};

/// The state needed for the journal page.
#[derive(Debug, Clone)]
pub struct JournalPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for JournalPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// Controls pagination of the journal table.
#[derive(Debug, Deserialize)]
pub struct JournalQuery {
    /// The page number to display, starting from 1.
    pub page: Option<u64>,
}

/// Render one page of the workspace's journal, newest entries first.
pub async fn get_journal_page(
    State(state): State<JournalPageState>,
    Extension(context): Extension<RequestContext>,
    Query(query): Query<JournalQuery>,
) -> Result<Response, Error> {
    let current_page = query.page.unwrap_or(state.pagination_config.default_page);
    let page_size = state.pagination_config.default_page_size;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let entry_count = count_journal_entries(context.workspace_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to count journal entries: {error}"))?;
    let page_count = (entry_count as u64).div_ceil(page_size).max(1);

    let entries = get_journal_entries(context.workspace_id, current_page, page_size, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve journal entries: {error}"))?;

    let indicators = create_pagination_indicators(
        current_page,
        page_count,
        state.pagination_config.max_pages,
    );

    Ok(journal_view(&entries, &indicators, &context).into_response())
}

fn journal_view(
    entries: &[JournalEntryDetail],
    indicators: &[PaginationIndicator],
    context: &RequestContext,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::JOURNAL_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { "Journal" }

                    div class="flex gap-4"
                    {
                        a href=(endpoints::EXPORT_JOURNAL) class=(LINK_STYLE) { "Export CSV" }

                        @if context.role.can_manage() {
                            a href=(endpoints::NEW_ENTRY_VIEW) class=(LINK_STYLE)
                            {
                                "New Entry"
                            }
                        }
                    }
                }

                section class="dark:bg-gray-800"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Memo" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Debit" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Credit" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for detail in entries {
                                (entry_rows(detail, context))
                            }

                            @if entries.is_empty() {
                                tr
                                {
                                    td
                                        colspan="6"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No journal entries yet."
                                    }
                                }
                            }
                        }
                    }
                }

                (pagination_view(indicators))
            }
        }
    );

    base("Journal", &content)
}

/// One header row plus one row per line.
fn entry_rows(detail: &JournalEntryDetail, context: &RequestContext) -> Markup {
    let entry = &detail.entry;
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_ENTRY_VIEW, entry.id);
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_ENTRY, entry.id);
    let confirm_message = format!(
        "Are you sure you want to delete the journal entry dated {}?",
        entry.date
    );

    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (entry.date) }
            td class=(TABLE_CELL_STYLE) { (entry.memo) }
            td class=(TABLE_CELL_STYLE) {}
            td class=(TABLE_CELL_STYLE) {}
            td class=(TABLE_CELL_STYLE) {}

            td class=(TABLE_CELL_STYLE)
            {
                @if context.role.can_manage() {
                    div class="flex gap-4"
                    {
                        a href=(edit_url) class=(LINK_STYLE) { "Edit" }

                        button
                            hx-delete=(delete_url)
                            hx-confirm=(confirm_message)
                            hx-target="closest tr"
                            hx-swap="delete"
                            class=(BUTTON_DELETE_STYLE)
                        {
                            "Delete"
                        }
                    }
                }
            }
        }

        @for line in &detail.lines {
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) {}
                td class=(TABLE_CELL_STYLE) {}

                td class=(TABLE_CELL_STYLE)
                {
                    (line.account_code) " " (line.account_name)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    @if line.kind == LineKind::Debit { (format_cents(line.amount)) }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    @if line.kind == LineKind::Credit { (format_cents(line.amount)) }
                }

                td class=(TABLE_CELL_STYLE) {}
            }
        }
    )
}

fn pagination_view(indicators: &[PaginationIndicator]) -> Markup {
    let page_url = |page: u64| format!("{}?page={page}", endpoints::JOURNAL_VIEW);

    html!(
        nav class="flex justify-center gap-2" aria-label="Journal pages"
        {
            @for indicator in indicators {
                @match indicator {
                    PaginationIndicator::BackButton(page) => {
                        a href=(page_url(*page)) class=(LINK_STYLE) { "Previous" }
                    }
                    PaginationIndicator::Page(page) => {
                        a href=(page_url(*page)) class=(LINK_STYLE) { (page) }
                    }
                    PaginationIndicator::CurrPage(page) => {
                        span class="font-bold" { (page) }
                    }
                    PaginationIndicator::Ellipsis => {
                        span { "..." }
                    }
                    PaginationIndicator::NextButton(page) => {
                        a href=(page_url(*page)) class=(LINK_STYLE) { "Next" }
                    }
                }
            }
        }
    )
}
