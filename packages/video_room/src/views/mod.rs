mod client_script;
mod room;

pub use room::room_page;

// Shared CSS constant
pub const CSS: &str = r#"
    * {
        margin: 0;
        padding: 0;
        box-sizing: border-box;
    }

    body {
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
        background: #111827;
        color: #e5e7eb;
        min-height: 100vh;
    }

    header {
        display: flex;
        align-items: center;
        justify-content: space-between;
        gap: 1rem;
        padding: 0.75rem 1.25rem;
        background: #1f2937;
        border-bottom: 1px solid #374151;
    }

    header h1 {
        font-size: 1.1rem;
        font-weight: 600;
    }

    .room-link {
        font-family: 'SF Mono', Monaco, 'Cascadia Code', monospace;
        font-size: 0.8rem;
        color: #9ca3af;
        overflow: hidden;
        text-overflow: ellipsis;
        white-space: nowrap;
    }

    #status {
        padding: 0.5rem 1.25rem;
        font-size: 0.875rem;
        color: #9ca3af;
    }

    #status.error {
        color: #f87171;
    }

    #video-grid {
        display: grid;
        grid-template-columns: repeat(auto-fill, 300px);
        grid-auto-rows: 300px;
        gap: 0.75rem;
        padding: 1.25rem;
    }

    video {
        width: 100%;
        height: 100%;
        object-fit: cover;
        border-radius: 0.5rem;
        background: #000;
    }
"#;
