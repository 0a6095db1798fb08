/// Browser side of the room: media capture, signaling, and one PeerJS call
/// per remote participant.
pub const JAVASCRIPT: &str = r#"
    const boot = window.ROOM_BOOTSTRAP;
    const videoGrid = document.getElementById('video-grid');
    const statusLine = document.getElementById('status');

    // peerId -> { call, video, state: 'pending' | 'active' }
    const sessions = new Map();

    function setStatus(text, isError) {
        statusLine.textContent = text;
        statusLine.classList.toggle('error', Boolean(isError));
    }

    function createSurface(peerId) {
        const video = document.createElement('video');
        video.playsInline = true;
        video.dataset.peerId = peerId;
        videoGrid.append(video);
        return video;
    }

    function attachStream(video, stream) {
        video.srcObject = stream;
        video.addEventListener('loadedmetadata', () => {
            video.play().catch((err) => console.warn('Autoplay blocked:', err));
        });
    }

    function openSession(peerId, call) {
        const session = { call, video: createSurface(peerId), state: 'pending' };
        sessions.set(peerId, session);

        call.on('stream', (remoteStream) => {
            if (session.state !== 'pending') return;
            session.state = 'active';
            attachStream(session.video, remoteStream);
        });
        call.on('close', () => closeSession(peerId, session));
        call.on('error', (err) => {
            console.warn(`Call with ${peerId} failed:`, err);
            closeSession(peerId, session);
        });
    }

    // Safe to call any number of times; only the live session for peerId is closed.
    function closeSession(peerId, expected) {
        const session = sessions.get(peerId);
        if (!session || (expected && session !== expected)) return;
        sessions.delete(peerId);
        session.video.remove();
        session.call.close();
    }

    function signalingUrl() {
        const protocol = window.location.protocol === 'https:' ? 'wss:' : 'ws:';
        return `${protocol}//${window.location.host}${boot.signalingPath}`;
    }

    async function start() {
        let localStream;
        try {
            localStream = await navigator.mediaDevices.getUserMedia(boot.media);
        } catch (err) {
            // Without local media there is nothing to offer; never join the room.
            setStatus(`Camera/microphone unavailable: ${err.message || err.name}`, true);
            return;
        }

        const preview = createSurface('local');
        preview.muted = true;
        attachStream(preview, localStream);
        setStatus('Connecting...');

        const socket = new WebSocket(signalingUrl());
        const socketOpen = new Promise((resolve) => {
            socket.addEventListener('open', resolve, { once: true });
        });
        const peer = new Peer(undefined, boot.peer);

        peer.on('call', (call) => {
            if (sessions.has(call.peer)) {
                call.close();
                return;
            }
            call.answer(localStream);
            openSession(call.peer, call);
        });

        socket.addEventListener('message', (event) => {
            let msg;
            try {
                msg = JSON.parse(event.data);
            } catch (err) {
                console.warn('Ignoring malformed signaling frame:', err);
                return;
            }
            switch (msg.type) {
                case 'user-connected':
                    if (!sessions.has(msg.peer_id)) {
                        openSession(msg.peer_id, peer.call(msg.peer_id, localStream));
                    }
                    break;
                case 'user-disconnected':
                    closeSession(msg.peer_id);
                    break;
                case 'error':
                    console.warn('Signaling error:', msg.message);
                    break;
            }
        });

        socket.addEventListener('close', () => {
            setStatus('Signaling connection lost', true);
            for (const peerId of [...sessions.keys()]) closeSession(peerId);
        });

        // Announce ourselves only once the media endpoint is reachable.
        peer.on('open', async (id) => {
            await socketOpen;
            socket.send(JSON.stringify({ type: 'join-room', room_id: boot.roomId, peer_id: id }));
            setStatus(`Joined room ${boot.roomId}`);
        });

        peer.on('error', (err) => setStatus(`Peer connection error: ${err.type || err}`, true));
    }

    document.addEventListener('DOMContentLoaded', start);
"#;
